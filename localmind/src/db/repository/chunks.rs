use chrono::Utc;
use libsql::{params, Connection};

use super::placeholders;
use crate::error::Result;
use crate::models::{ChunkCandidate, ChunkMetadata, ChunkRecord};

pub struct ChunkRepository;

impl ChunkRepository {
    /// Write a document's chunks, replacing rows with the same id and removing
    /// ordinals beyond the new chunk count.
    pub async fn upsert_for_document(
        conn: &Connection,
        document_id: &str,
        chunks: &[ChunkRecord],
    ) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction().await?;

        for chunk in chunks {
            let embedding_json = serde_json::to_string(&chunk.embedding)?;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks (
                    id, document_id, ordinal, content, source, embedding, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, vector32(?6), ?7)
                "#,
                params![
                    chunk.id.clone(),
                    chunk.document_id.clone(),
                    chunk.ordinal as i64,
                    chunk.content.clone(),
                    chunk.source.clone(),
                    embedding_json,
                    now.clone(),
                ],
            )
            .await?;
        }

        tx.execute(
            "DELETE FROM chunks WHERE document_id = ?1 AND ordinal >= ?2",
            params![document_id, chunks.len() as i64],
        )
        .await?;

        tx.commit().await?;

        Ok(chunks.len())
    }

    /// Nearest chunks by cosine similarity, restricted to `document_ids`.
    pub async fn search_similar(
        conn: &Connection,
        embedding: &[f32],
        limit: usize,
        document_ids: &[String],
    ) -> Result<Vec<ChunkCandidate>> {
        if document_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let embedding_json = serde_json::to_string(embedding)?;

        // Fixed params: ?1=embedding, ?2=limit; document ids start at ?3
        let query = format!(
            r#"
            SELECT
                c.id,
                c.document_id,
                c.content,
                c.source,
                1 - vector_distance_cos(c.embedding, vector32(?1)) as score
            FROM chunks c
            WHERE c.document_id IN ({})
            ORDER BY score DESC
            LIMIT ?2
            "#,
            placeholders(3, document_ids.len())
        );

        let mut param_values: Vec<libsql::Value> = vec![
            libsql::Value::from(embedding_json),
            libsql::Value::from(limit as i64),
        ];
        param_values.extend(
            document_ids
                .iter()
                .map(|id| libsql::Value::from(id.clone())),
        );

        let mut rows = conn
            .query(&query, libsql::params_from_iter(param_values))
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(ChunkCandidate {
                id: row.get(0)?,
                metadata: ChunkMetadata {
                    document_id: row.get(1)?,
                    source: row.get(3)?,
                },
                content: row.get(2)?,
                similarity: row.get::<f64>(4)? as f32,
            });
        }

        Ok(results)
    }

    pub async fn delete_by_document_id(conn: &Connection, document_id: &str) -> Result<u64> {
        let affected = conn
            .execute(
                "DELETE FROM chunks WHERE document_id = ?1",
                params![document_id],
            )
            .await?;

        Ok(affected)
    }

    pub async fn count_by_document_id(conn: &Connection, document_id: &str) -> Result<usize> {
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM chunks WHERE document_id = ?1",
                params![document_id],
            )
            .await?;

        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(count as usize)
    }

    pub async fn ids_by_document_id(conn: &Connection, document_id: &str) -> Result<Vec<String>> {
        let mut rows = conn
            .query(
                "SELECT id FROM chunks WHERE document_id = ?1 ORDER BY ordinal",
                params![document_id],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::setup_test_db;

    fn record(document_id: &str, ordinal: usize, embedding: [f32; 3]) -> ChunkRecord {
        ChunkRecord {
            id: ChunkRecord::chunk_id(document_id, ordinal),
            document_id: document_id.to_string(),
            ordinal,
            content: format!("{document_id} chunk {ordinal}"),
            source: format!("{document_id}-name"),
            embedding: embedding.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_reindex_with_fewer_chunks_drops_tail() {
        let (_dir, conn) = setup_test_db().await;

        let first: Vec<_> = (0..4).map(|i| record("d1", i, [1.0, 0.0, 0.0])).collect();
        ChunkRepository::upsert_for_document(&conn, "d1", &first)
            .await
            .unwrap();
        assert_eq!(ChunkRepository::count_by_document_id(&conn, "d1").await.unwrap(), 4);

        let second: Vec<_> = (0..2).map(|i| record("d1", i, [0.0, 1.0, 0.0])).collect();
        ChunkRepository::upsert_for_document(&conn, "d1", &second)
            .await
            .unwrap();

        assert_eq!(
            ChunkRepository::ids_by_document_id(&conn, "d1").await.unwrap(),
            vec!["d1_0", "d1_1"]
        );
    }

    #[tokio::test]
    async fn test_search_respects_document_filter_and_order() {
        let (_dir, conn) = setup_test_db().await;

        ChunkRepository::upsert_for_document(
            &conn,
            "d1",
            &[record("d1", 0, [1.0, 0.0, 0.0]), record("d1", 1, [0.7, 0.7, 0.0])],
        )
        .await
        .unwrap();
        // Closest vector overall, but outside the allowed set
        ChunkRepository::upsert_for_document(&conn, "d2", &[record("d2", 0, [1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let results = ChunkRepository::search_similar(
            &conn,
            &[1.0, 0.0, 0.0],
            10,
            &["d1".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.metadata.document_id == "d1"));
        assert_eq!(results[0].id, "d1_0");
        assert_eq!(results[0].metadata.source, "d1-name");
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_search_with_empty_scope_returns_nothing() {
        let (_dir, conn) = setup_test_db().await;
        ChunkRepository::upsert_for_document(&conn, "d1", &[record("d1", 0, [1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let results = ChunkRepository::search_similar(&conn, &[1.0, 0.0, 0.0], 5, &[])
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_document_id() {
        let (_dir, conn) = setup_test_db().await;
        ChunkRepository::upsert_for_document(&conn, "d1", &[record("d1", 0, [1.0, 0.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(
            ChunkRepository::delete_by_document_id(&conn, "d1").await.unwrap(),
            1
        );
        assert_eq!(ChunkRepository::count_by_document_id(&conn, "d1").await.unwrap(), 0);
    }
}
