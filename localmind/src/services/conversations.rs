use std::sync::Arc;

use uuid::Uuid;

use crate::db::DatabaseBackend;
use crate::error::{LocalMindError, Result};
use crate::models::{Conversation, ConversationType, Message};

#[derive(Clone)]
pub struct ConversationService {
    db: Arc<dyn DatabaseBackend>,
}

impl ConversationService {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }

    /// Create a conversation linked to `group_ids`. Every group must exist.
    pub async fn create(
        &self,
        title: &str,
        conv_type: ConversationType,
        group_ids: &[String],
    ) -> Result<(Conversation, Vec<String>)> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LocalMindError::Validation(
                "Conversation title cannot be empty".to_string(),
            ));
        }

        let mut unique_ids: Vec<String> = Vec::with_capacity(group_ids.len());
        for id in group_ids {
            if !unique_ids.contains(id) {
                unique_ids.push(id.clone());
            }
        }

        let found = self.db.get_groups_by_ids(&unique_ids).await?;
        if found.len() != unique_ids.len() {
            let missing: Vec<&str> = unique_ids
                .iter()
                .filter(|id| !found.iter().any(|g| &g.id == *id))
                .map(String::as_str)
                .collect();
            return Err(LocalMindError::Validation(format!(
                "Unknown document groups: {}",
                missing.join(", ")
            )));
        }

        let conversation = Conversation::new(Uuid::new_v4().to_string(), title.to_string(), conv_type);
        self.db.create_conversation(&conversation).await?;
        for group_id in &unique_ids {
            self.db
                .link_conversation_group(&conversation.id, group_id)
                .await?;
        }

        tracing::info!(
            conversation_id = %conversation.id,
            conv_type = %conv_type,
            groups = unique_ids.len(),
            "Conversation created"
        );

        Ok((conversation, unique_ids))
    }

    pub async fn list(&self) -> Result<Vec<Conversation>> {
        self.db.list_conversations().await
    }

    pub async fn get(&self, conversation_id: &str) -> Result<(Conversation, Vec<String>)> {
        let conversation = self
            .db
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| {
                LocalMindError::NotFound(format!("Conversation {conversation_id} not found"))
            })?;
        let group_ids = self.db.conversation_group_ids(conversation_id).await?;
        Ok((conversation, group_ids))
    }

    pub async fn delete(&self, conversation_id: &str) -> Result<()> {
        self.get(conversation_id).await?;

        let messages = self.db.delete_messages_by_conversation(conversation_id).await?;
        self.db.unlink_conversation_groups(conversation_id).await?;
        self.db.delete_conversation(conversation_id).await?;

        tracing::info!(conversation_id, messages, "Conversation deleted");
        Ok(())
    }

    /// Messages in creation order.
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.get(conversation_id).await?;
        self.db.list_messages(conversation_id).await
    }
}
