use libsql::{params, Connection};

use super::parse_timestamp;
use crate::error::Result;
use crate::models::{Message, MessageSender};

const MESSAGE_COLUMNS: &str = "id, conversation_id, text, sender, created_at";

pub struct MessageRepository;

impl MessageRepository {
    pub async fn create(conn: &Connection, message: &Message) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO messages (id, conversation_id, text, sender, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                message.id.clone(),
                message.conversation_id.clone(),
                message.text.clone(),
                message.sender.to_string(),
                message.created_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Message>> {
        let mut rows = conn
            .query(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_message(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Messages of a conversation, oldest first. Insertion order breaks timestamp ties.
    pub async fn list_by_conversation(
        conn: &Connection,
        conversation_id: &str,
    ) -> Result<Vec<Message>> {
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ?1 ORDER BY created_at, rowid"
                ),
                params![conversation_id],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_message(&row)?);
        }
        Ok(results)
    }

    pub async fn update_text(conn: &Connection, id: &str, text: &str) -> Result<bool> {
        let affected = conn
            .execute(
                "UPDATE messages SET text = ?2 WHERE id = ?1",
                params![id, text],
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn delete_by_conversation(conn: &Connection, conversation_id: &str) -> Result<u64> {
        let affected = conn
            .execute(
                "DELETE FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
            )
            .await?;
        Ok(affected)
    }

    fn row_to_message(row: &libsql::Row) -> Result<Message> {
        Ok(Message {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            text: row.get(2)?,
            sender: row
                .get::<String>(3)?
                .parse()
                .unwrap_or(MessageSender::User),
            created_at: parse_timestamp(&row.get::<String>(4)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{setup_test_db, ConversationRepository};
    use crate::models::{Conversation, ConversationType};

    #[tokio::test]
    async fn test_messages_keep_insertion_order_on_equal_timestamps() {
        let (_dir, conn) = setup_test_db().await;
        ConversationRepository::create(
            &conn,
            &Conversation::new("c1".to_string(), "Chat".to_string(), ConversationType::General),
        )
        .await
        .unwrap();

        let first = Message::new(
            "m1".to_string(),
            "c1".to_string(),
            "hello".to_string(),
            MessageSender::User,
        );
        let mut second = Message::new(
            "m2".to_string(),
            "c1".to_string(),
            String::new(),
            MessageSender::Assistant,
        );
        second.created_at = first.created_at;

        MessageRepository::create(&conn, &first).await.unwrap();
        MessageRepository::create(&conn, &second).await.unwrap();

        let messages = MessageRepository::list_by_conversation(&conn, "c1")
            .await
            .unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(messages[1].sender, MessageSender::Assistant);
    }

    #[tokio::test]
    async fn test_update_text() {
        let (_dir, conn) = setup_test_db().await;
        ConversationRepository::create(
            &conn,
            &Conversation::new("c1".to_string(), "Chat".to_string(), ConversationType::General),
        )
        .await
        .unwrap();
        let message = Message::new(
            "m1".to_string(),
            "c1".to_string(),
            String::new(),
            MessageSender::Assistant,
        );
        MessageRepository::create(&conn, &message).await.unwrap();

        assert!(MessageRepository::update_text(&conn, "m1", "answer")
            .await
            .unwrap());
        assert!(!MessageRepository::update_text(&conn, "missing", "answer")
            .await
            .unwrap());

        let loaded = MessageRepository::get_by_id(&conn, "m1").await.unwrap().unwrap();
        assert_eq!(loaded.text, "answer");
    }
}
