use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    ChunkCandidate, ChunkRecord, Conversation, Document, DocumentGroup, Message,
};

// ---------------------------------------------------------------------------
// Relational stores
// ---------------------------------------------------------------------------

/// CRUD for document groups and their training bookkeeping.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn create_group(&self, group: &DocumentGroup) -> Result<()>;
    async fn get_group(&self, id: &str) -> Result<Option<DocumentGroup>>;
    async fn get_groups_by_ids(&self, ids: &[String]) -> Result<Vec<DocumentGroup>>;
    async fn list_groups(&self) -> Result<Vec<DocumentGroup>>;
    async fn touch_group(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
    async fn mark_group_trained(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
    async fn clear_all_trained(&self) -> Result<u64>;
    async fn delete_group(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, doc: &Document) -> Result<()>;
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;
    async fn list_documents_by_group(&self, group_id: &str) -> Result<Vec<Document>>;
    async fn delete_document(&self, id: &str) -> Result<bool>;
}

/// Conversations, their group links and the retrieval scope derived from them.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<()>;
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>>;
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;
    async fn touch_conversation(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
    async fn delete_conversation(&self, id: &str) -> Result<bool>;
    async fn link_conversation_group(&self, conversation_id: &str, group_id: &str) -> Result<()>;
    async fn conversation_group_ids(&self, conversation_id: &str) -> Result<Vec<String>>;
    async fn unlink_conversation_groups(&self, conversation_id: &str) -> Result<()>;
    async fn unlink_group_from_conversations(&self, group_id: &str) -> Result<()>;
    async fn allowed_document_ids(&self, conversation_id: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(&self, message: &Message) -> Result<()>;
    async fn get_message(&self, id: &str) -> Result<Option<Message>>;
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;
    async fn update_message_text(&self, id: &str, text: &str) -> Result<bool>;
    async fn delete_messages_by_conversation(&self, conversation_id: &str) -> Result<u64>;
}

// ---------------------------------------------------------------------------
// Vector store
// ---------------------------------------------------------------------------

/// Chunk vectors keyed by `{document_id}_{ordinal}`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace the indexed chunks of one document. Returns the number written.
    async fn upsert_chunks(&self, document_id: &str, chunks: &[ChunkRecord]) -> Result<usize>;
    /// Nearest `limit` chunks by cosine similarity among `document_ids`.
    async fn query_chunks(
        &self,
        embedding: &[f32],
        limit: usize,
        document_ids: &[String],
    ) -> Result<Vec<ChunkCandidate>>;
    async fn delete_chunks_by_document(&self, document_id: &str) -> Result<u64>;
    async fn count_chunks_by_document(&self, document_id: &str) -> Result<usize>;
    async fn chunk_ids_by_document(&self, document_id: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get_embedding_dimensions(&self) -> Result<Option<usize>>;
    async fn set_embedding_dimensions(&self, dims: usize) -> Result<()>;
    async fn get_embedding_model(&self) -> Result<Option<String>>;
    async fn set_embedding_model(&self, model: &str) -> Result<()>;
    /// Drop every chunk and recreate the vector column with a new width.
    async fn rebuild_vector_index(&self, dims: usize) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Combined backend
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DatabaseBackend:
    GroupStore + DocumentStore + ConversationStore + MessageStore + VectorStore + MetadataStore
{
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
