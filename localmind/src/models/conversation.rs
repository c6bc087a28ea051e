use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationType, MessageSender};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub conv_type: ConversationType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: String, title: String, conv_type: ConversationType) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            conv_type,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub text: String,
    pub sender: MessageSender,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(id: String, conversation_id: String, text: String, sender: MessageSender) -> Self {
        Self {
            id,
            conversation_id,
            text,
            sender,
            created_at: Utc::now(),
        }
    }
}
