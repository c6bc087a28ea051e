use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use super::parse_timestamp;
use crate::error::Result;
use crate::models::{Conversation, ConversationType};

const CONVERSATION_COLUMNS: &str = "id, title, conv_type, created_at, updated_at";

pub struct ConversationRepository;

impl ConversationRepository {
    pub async fn create(conn: &Connection, conversation: &Conversation) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO conversations (id, title, conv_type, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                conversation.id.clone(),
                conversation.title.clone(),
                conversation.conv_type.to_string(),
                conversation.created_at.to_rfc3339(),
                conversation.updated_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Conversation>> {
        let mut rows = conn
            .query(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_conversation(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list(conn: &Connection) -> Result<Vec<Conversation>> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations ORDER BY updated_at DESC"
                ),
                (),
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_conversation(&row)?);
        }
        Ok(results)
    }

    pub async fn touch(conn: &Connection, id: &str, at: DateTime<Utc>) -> Result<()> {
        conn.execute(
            "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
            params![id, at.to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    pub async fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let affected = conn
            .execute("DELETE FROM conversations WHERE id = ?1", params![id])
            .await?;
        Ok(affected > 0)
    }

    pub async fn link_group(conn: &Connection, conversation_id: &str, group_id: &str) -> Result<()> {
        conn.execute(
            r#"
            INSERT OR IGNORE INTO conversation_groups (conversation_id, group_id, added_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![conversation_id, group_id, Utc::now().to_rfc3339()],
        )
        .await?;
        Ok(())
    }

    pub async fn linked_group_ids(conn: &Connection, conversation_id: &str) -> Result<Vec<String>> {
        let mut rows = conn
            .query(
                "SELECT group_id FROM conversation_groups WHERE conversation_id = ?1 ORDER BY added_at",
                params![conversation_id],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    /// Ids of every document in every group linked to the conversation.
    pub async fn allowed_document_ids(
        conn: &Connection,
        conversation_id: &str,
    ) -> Result<Vec<String>> {
        let mut rows = conn
            .query(
                r#"
                SELECT DISTINCT d.id
                FROM conversation_groups cg
                JOIN documents d ON d.group_id = cg.group_id
                WHERE cg.conversation_id = ?1
                "#,
                params![conversation_id],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    pub async fn unlink_all_groups(conn: &Connection, conversation_id: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM conversation_groups WHERE conversation_id = ?1",
            params![conversation_id],
        )
        .await?;
        Ok(())
    }

    pub async fn unlink_group_everywhere(conn: &Connection, group_id: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM conversation_groups WHERE group_id = ?1",
            params![group_id],
        )
        .await?;
        Ok(())
    }

    fn row_to_conversation(row: &libsql::Row) -> Result<Conversation> {
        Ok(Conversation {
            id: row.get(0)?,
            title: row.get(1)?,
            conv_type: row
                .get::<String>(2)?
                .parse()
                .unwrap_or(ConversationType::General),
            created_at: parse_timestamp(&row.get::<String>(3)?),
            updated_at: parse_timestamp(&row.get::<String>(4)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{setup_test_db, DocumentRepository, GroupRepository};
    use crate::models::{Document, DocumentFormat, DocumentGroup};

    async fn seed(conn: &Connection) {
        for group in ["g1", "g2"] {
            GroupRepository::create(conn, &DocumentGroup::new(group.to_string(), group.to_string()))
                .await
                .unwrap();
        }
        for (doc, group) in [("d1", "g1"), ("d2", "g1"), ("d3", "g2")] {
            DocumentRepository::create(
                conn,
                &Document::new(
                    doc.to_string(),
                    group.to_string(),
                    doc.to_string(),
                    format!("/blobs/{doc}"),
                    DocumentFormat::Txt,
                ),
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_allowed_document_ids_follow_links() {
        let (_dir, conn) = setup_test_db().await;
        seed(&conn).await;

        let conversation =
            Conversation::new("c1".to_string(), "Chat".to_string(), ConversationType::Rag);
        ConversationRepository::create(&conn, &conversation).await.unwrap();

        assert!(ConversationRepository::allowed_document_ids(&conn, "c1")
            .await
            .unwrap()
            .is_empty());

        ConversationRepository::link_group(&conn, "c1", "g1").await.unwrap();
        // Linking twice is harmless
        ConversationRepository::link_group(&conn, "c1", "g1").await.unwrap();

        let mut ids = ConversationRepository::allowed_document_ids(&conn, "c1")
            .await
            .unwrap();
        ids.sort();
        assert_eq!(ids, vec!["d1", "d2"]);
    }

    #[tokio::test]
    async fn test_conversation_type_persists() {
        let (_dir, conn) = setup_test_db().await;
        let conversation = Conversation::new(
            "c1".to_string(),
            "Strict".to_string(),
            ConversationType::StrictRag,
        );
        ConversationRepository::create(&conn, &conversation).await.unwrap();

        let loaded = ConversationRepository::get_by_id(&conn, "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.conv_type, ConversationType::StrictRag);
        assert_eq!(loaded.title, "Strict");
    }
}
