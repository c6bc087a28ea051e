use crate::error::Result;
use chrono::Utc;
use libsql::Connection;

const EMBEDDING_DIMENSIONS_KEY: &str = "embedding_dimensions";
const EMBEDDING_MODEL_KEY: &str = "embedding_model";

pub struct MetadataRepository;

impl MetadataRepository {
    pub async fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        let mut rows = conn
            .query("SELECT value FROM localmind_meta WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get::<String>(0)?))
        } else {
            Ok(None)
        }
    }

    pub async fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO localmind_meta (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            [key, value, &now],
        )
        .await?;
        Ok(())
    }

    pub async fn get_embedding_dimensions(conn: &Connection) -> Result<Option<usize>> {
        match Self::get(conn, EMBEDDING_DIMENSIONS_KEY).await? {
            Some(s) => Ok(s.parse().ok()),
            None => Ok(None),
        }
    }

    pub async fn set_embedding_dimensions(conn: &Connection, dims: usize) -> Result<()> {
        Self::set(conn, EMBEDDING_DIMENSIONS_KEY, &dims.to_string()).await
    }

    pub async fn get_embedding_model(conn: &Connection) -> Result<Option<String>> {
        Self::get(conn, EMBEDDING_MODEL_KEY).await
    }

    pub async fn set_embedding_model(conn: &Connection, model: &str) -> Result<()> {
        Self::set(conn, EMBEDDING_MODEL_KEY, model).await
    }
}
