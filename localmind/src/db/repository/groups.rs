use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Connection};

use super::parse_timestamp;
use crate::error::Result;
use crate::models::DocumentGroup;

/// `last_trained` is compared as text in SQL, so every writer uses this
/// fixed-width UTC form.
fn trained_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub struct GroupRepository;

impl GroupRepository {
    pub async fn create(conn: &Connection, group: &DocumentGroup) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO document_groups (id, name, created_at, updated_at, last_trained)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                group.id.clone(),
                group.name.clone(),
                group.created_at.to_rfc3339(),
                group.updated_at.to_rfc3339(),
                group.last_trained.map(trained_stamp),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<DocumentGroup>> {
        let mut rows = conn
            .query(
                "SELECT id, name, created_at, updated_at, last_trained FROM document_groups WHERE id = ?1",
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_group(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<DocumentGroup>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name, created_at, updated_at, last_trained FROM document_groups WHERE id IN ({})",
            super::placeholders(1, ids.len())
        );
        let values: Vec<libsql::Value> =
            ids.iter().map(|id| libsql::Value::from(id.clone())).collect();

        let mut rows = conn.query(&sql, libsql::params_from_iter(values)).await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_group(&row)?);
        }
        Ok(results)
    }

    pub async fn list(conn: &Connection) -> Result<Vec<DocumentGroup>> {
        let mut rows = conn
            .query(
                "SELECT id, name, created_at, updated_at, last_trained FROM document_groups ORDER BY created_at DESC",
                (),
            )
            .await?;

        let mut groups = Vec::new();
        while let Some(row) = rows.next().await? {
            groups.push(Self::row_to_group(&row)?);
        }
        Ok(groups)
    }

    pub async fn touch(conn: &Connection, id: &str, at: DateTime<Utc>) -> Result<()> {
        conn.execute(
            "UPDATE document_groups SET updated_at = ?2 WHERE id = ?1",
            params![id, at.to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    /// Record a successful training run. Never moves `last_trained` backwards.
    pub async fn mark_trained(conn: &Connection, id: &str, at: DateTime<Utc>) -> Result<()> {
        conn.execute(
            r#"
            UPDATE document_groups
            SET last_trained = ?2
            WHERE id = ?1 AND (last_trained IS NULL OR last_trained < ?2)
            "#,
            params![id, trained_stamp(at)],
        )
        .await?;
        Ok(())
    }

    /// Forget every training timestamp, so all groups report stale.
    pub async fn clear_trained(conn: &Connection) -> Result<u64> {
        let affected = conn
            .execute("UPDATE document_groups SET last_trained = NULL", ())
            .await?;
        Ok(affected)
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let affected = conn
            .execute("DELETE FROM document_groups WHERE id = ?1", params![id])
            .await?;
        Ok(affected > 0)
    }

    fn row_to_group(row: &libsql::Row) -> Result<DocumentGroup> {
        Ok(DocumentGroup {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: parse_timestamp(&row.get::<String>(2)?),
            updated_at: parse_timestamp(&row.get::<String>(3)?),
            last_trained: row
                .get::<Option<String>>(4)?
                .map(|raw| parse_timestamp(&raw)),
        })
    }
}
