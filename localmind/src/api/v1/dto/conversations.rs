//! Conversation and message DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{self, ConversationType, MessageSender};

/// Request body for `POST /v1/conversations`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    /// Retrieval mode, fixed for the life of the conversation. Defaults to `general`.
    #[serde(default)]
    pub conv_type: ConversationType,
    /// Groups the conversation may retrieve from.
    #[serde(default)]
    pub group_ids: Vec<String>,
}

/// Request body for `POST /v1/conversations/{conversationId}/messages`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "Message text cannot be empty"))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub title: String,
    pub conv_type: ConversationType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub group_ids: Vec<String>,
}

impl ConversationResponse {
    pub fn new(conversation: models::Conversation, group_ids: Vec<String>) -> Self {
        Self {
            id: conversation.id,
            title: conversation.title,
            conv_type: conversation.conv_type,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
            group_ids,
        }
    }
}

/// List entry for `GET /v1/conversations`, without group links.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryResponse {
    pub id: String,
    pub title: String,
    pub conv_type: ConversationType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<models::Conversation> for ConversationSummaryResponse {
    fn from(conversation: models::Conversation) -> Self {
        Self {
            id: conversation.id,
            title: conversation.title,
            conv_type: conversation.conv_type,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub text: String,
    pub sender: MessageSender,
    pub created_at: DateTime<Utc>,
}

impl From<models::Message> for MessageResponse {
    fn from(message: models::Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            text: message.text,
            sender: message.sender,
            created_at: message.created_at,
        }
    }
}
