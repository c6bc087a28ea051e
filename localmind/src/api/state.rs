use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::embeddings::{EmbeddingProvider, RerankerProvider};
use crate::llm::ChatClient;
use crate::processing::IndexingPipeline;
use crate::services::{
    ChatService, ConversationService, DocumentService, GroupService, RetrievalEngine,
};
use crate::storage::BlobStore;

/// Handles shared by every request, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub blobs: Arc<dyn BlobStore>,
    pub embeddings: EmbeddingProvider,
    pub groups: GroupService,
    pub documents: DocumentService,
    pub conversations: ConversationService,
    pub retrieval: RetrievalEngine,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        blobs: Arc<dyn BlobStore>,
        embeddings: EmbeddingProvider,
        reranker: RerankerProvider,
        llm: ChatClient,
    ) -> Self {
        let config = Arc::new(config);

        let documents = DocumentService::new(db.clone(), blobs.clone());
        let pipeline = Arc::new(IndexingPipeline::new(
            db.clone(),
            blobs.clone(),
            embeddings.clone(),
            &config,
        ));
        let groups = GroupService::new(db.clone(), documents.clone(), pipeline);
        let conversations = ConversationService::new(db.clone());
        let retrieval =
            RetrievalEngine::new(db.clone(), embeddings.clone(), reranker, &config.search);
        let chat = ChatService::new(
            db.clone(),
            retrieval.clone(),
            llm,
            config.search.n_results,
        );

        Self {
            config,
            db,
            blobs,
            embeddings,
            groups,
            documents,
            conversations,
            retrieval,
            chat,
        }
    }

    /// Tie streamed answers to server shutdown.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.chat = self.chat.with_shutdown(token);
        self
    }
}
