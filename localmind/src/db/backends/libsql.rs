use crate::db::connection::Database;
use crate::db::repository::{
    ChunkRepository, ConversationRepository, DocumentRepository, GroupRepository,
    MessageRepository,
};
use crate::db::schema;
use crate::db::traits::{
    ConversationStore, DatabaseBackend, DocumentStore, GroupStore, MessageStore, MetadataStore,
    VectorStore,
};
use crate::db::MetadataRepository;
use crate::error::Result;
use crate::models::{
    ChunkCandidate, ChunkRecord, Conversation, Document, DocumentGroup, Message,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GroupStore for LibSqlBackend {
    async fn create_group(&self, group: &DocumentGroup) -> Result<()> {
        let conn = self.db.connect()?;
        GroupRepository::create(&conn, group).await
    }
    async fn get_group(&self, id: &str) -> Result<Option<DocumentGroup>> {
        let conn = self.db.connect()?;
        GroupRepository::get_by_id(&conn, id).await
    }
    async fn get_groups_by_ids(&self, ids: &[String]) -> Result<Vec<DocumentGroup>> {
        let conn = self.db.connect()?;
        GroupRepository::get_by_ids(&conn, ids).await
    }
    async fn list_groups(&self) -> Result<Vec<DocumentGroup>> {
        let conn = self.db.connect()?;
        GroupRepository::list(&conn).await
    }
    async fn touch_group(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.db.connect()?;
        GroupRepository::touch(&conn, id, at).await
    }
    async fn mark_group_trained(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.db.connect()?;
        GroupRepository::mark_trained(&conn, id, at).await
    }
    async fn clear_all_trained(&self) -> Result<u64> {
        let conn = self.db.connect()?;
        GroupRepository::clear_trained(&conn).await
    }
    async fn delete_group(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        GroupRepository::delete(&conn, id).await
    }
}

#[async_trait]
impl DocumentStore for LibSqlBackend {
    async fn create_document(&self, doc: &Document) -> Result<()> {
        let conn = self.db.connect()?;
        DocumentRepository::create(&conn, doc).await
    }
    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let conn = self.db.connect()?;
        DocumentRepository::get_by_id(&conn, id).await
    }
    async fn list_documents_by_group(&self, group_id: &str) -> Result<Vec<Document>> {
        let conn = self.db.connect()?;
        DocumentRepository::list_by_group(&conn, group_id).await
    }
    async fn delete_document(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        DocumentRepository::delete(&conn, id).await
    }
}

#[async_trait]
impl ConversationStore for LibSqlBackend {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<()> {
        let conn = self.db.connect()?;
        ConversationRepository::create(&conn, conversation).await
    }
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let conn = self.db.connect()?;
        ConversationRepository::get_by_id(&conn, id).await
    }
    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let conn = self.db.connect()?;
        ConversationRepository::list(&conn).await
    }
    async fn touch_conversation(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.db.connect()?;
        ConversationRepository::touch(&conn, id, at).await
    }
    async fn delete_conversation(&self, id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        ConversationRepository::delete(&conn, id).await
    }
    async fn link_conversation_group(&self, conversation_id: &str, group_id: &str) -> Result<()> {
        let conn = self.db.connect()?;
        ConversationRepository::link_group(&conn, conversation_id, group_id).await
    }
    async fn conversation_group_ids(&self, conversation_id: &str) -> Result<Vec<String>> {
        let conn = self.db.connect()?;
        ConversationRepository::linked_group_ids(&conn, conversation_id).await
    }
    async fn unlink_conversation_groups(&self, conversation_id: &str) -> Result<()> {
        let conn = self.db.connect()?;
        ConversationRepository::unlink_all_groups(&conn, conversation_id).await
    }
    async fn unlink_group_from_conversations(&self, group_id: &str) -> Result<()> {
        let conn = self.db.connect()?;
        ConversationRepository::unlink_group_everywhere(&conn, group_id).await
    }
    async fn allowed_document_ids(&self, conversation_id: &str) -> Result<Vec<String>> {
        let conn = self.db.connect()?;
        ConversationRepository::allowed_document_ids(&conn, conversation_id).await
    }
}

#[async_trait]
impl MessageStore for LibSqlBackend {
    async fn create_message(&self, message: &Message) -> Result<()> {
        let conn = self.db.connect()?;
        MessageRepository::create(&conn, message).await
    }
    async fn get_message(&self, id: &str) -> Result<Option<Message>> {
        let conn = self.db.connect()?;
        MessageRepository::get_by_id(&conn, id).await
    }
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let conn = self.db.connect()?;
        MessageRepository::list_by_conversation(&conn, conversation_id).await
    }
    async fn update_message_text(&self, id: &str, text: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        MessageRepository::update_text(&conn, id, text).await
    }
    async fn delete_messages_by_conversation(&self, conversation_id: &str) -> Result<u64> {
        let conn = self.db.connect()?;
        MessageRepository::delete_by_conversation(&conn, conversation_id).await
    }
}

#[async_trait]
impl VectorStore for LibSqlBackend {
    async fn upsert_chunks(&self, document_id: &str, chunks: &[ChunkRecord]) -> Result<usize> {
        let conn = self.db.connect()?;
        ChunkRepository::upsert_for_document(&conn, document_id, chunks).await
    }
    async fn query_chunks(
        &self,
        embedding: &[f32],
        limit: usize,
        document_ids: &[String],
    ) -> Result<Vec<ChunkCandidate>> {
        let conn = self.db.connect()?;
        ChunkRepository::search_similar(&conn, embedding, limit, document_ids).await
    }
    async fn delete_chunks_by_document(&self, document_id: &str) -> Result<u64> {
        let conn = self.db.connect()?;
        ChunkRepository::delete_by_document_id(&conn, document_id).await
    }
    async fn count_chunks_by_document(&self, document_id: &str) -> Result<usize> {
        let conn = self.db.connect()?;
        ChunkRepository::count_by_document_id(&conn, document_id).await
    }
    async fn chunk_ids_by_document(&self, document_id: &str) -> Result<Vec<String>> {
        let conn = self.db.connect()?;
        ChunkRepository::ids_by_document_id(&conn, document_id).await
    }
}

#[async_trait]
impl MetadataStore for LibSqlBackend {
    async fn get_embedding_dimensions(&self) -> Result<Option<usize>> {
        let conn = self.db.connect()?;
        MetadataRepository::get_embedding_dimensions(&conn).await
    }
    async fn set_embedding_dimensions(&self, dims: usize) -> Result<()> {
        let conn = self.db.connect()?;
        MetadataRepository::set_embedding_dimensions(&conn, dims).await
    }
    async fn get_embedding_model(&self) -> Result<Option<String>> {
        let conn = self.db.connect()?;
        MetadataRepository::get_embedding_model(&conn).await
    }
    async fn set_embedding_model(&self, model: &str) -> Result<()> {
        let conn = self.db.connect()?;
        MetadataRepository::set_embedding_model(&conn, model).await
    }
    async fn rebuild_vector_index(&self, dims: usize) -> Result<()> {
        let conn = self.db.connect()?;
        schema::rebuild_chunk_table(&conn, dims).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}
