use libsql::{params, Connection};

use super::parse_timestamp;
use crate::error::Result;
use crate::models::{Document, DocumentFormat};

const DOCUMENT_COLUMNS: &str = "id, group_id, name, path, format, uploaded_at";

pub struct DocumentRepository;

impl DocumentRepository {
    pub async fn create(conn: &Connection, doc: &Document) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO documents (id, group_id, name, path, format, uploaded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                doc.id.clone(),
                doc.group_id.clone(),
                doc.name.clone(),
                doc.path.clone(),
                doc.format.to_string(),
                doc.uploaded_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Document>> {
        let mut rows = conn
            .query(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_document(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_by_group(conn: &Connection, group_id: &str) -> Result<Vec<Document>> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE group_id = ?1 ORDER BY uploaded_at, rowid"
                ),
                params![group_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_document(&row)?);
        }
        Ok(results)
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let affected = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id])
            .await?;
        Ok(affected > 0)
    }

    fn row_to_document(row: &libsql::Row) -> Result<Document> {
        Ok(Document {
            id: row.get(0)?,
            group_id: row.get(1)?,
            name: row.get(2)?,
            path: row.get(3)?,
            format: row
                .get::<String>(4)?
                .parse()
                .unwrap_or(DocumentFormat::Txt),
            uploaded_at: parse_timestamp(&row.get::<String>(5)?),
        })
    }
}
