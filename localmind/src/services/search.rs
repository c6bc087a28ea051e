use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::db::DatabaseBackend;
use crate::embeddings::{EmbeddingProvider, RerankerProvider};
use crate::error::Result;
use crate::models::{ChunkCandidate, RetrievalResult};

/// Maps a conversation to the documents it may retrieve from.
#[derive(Clone)]
pub struct AccessScopeResolver {
    db: Arc<dyn DatabaseBackend>,
}

impl AccessScopeResolver {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }

    /// Ids of every document in every group linked to the conversation.
    pub async fn allowed_document_ids(&self, conversation_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .db
            .allowed_document_ids(conversation_id)
            .await?
            .into_iter()
            .collect())
    }
}

/// Two-stage retrieval: filtered vector search, then reranking.
///
/// Never fails. Any problem along the way is logged and yields fewer (or no)
/// results, so chat falls back to ungrounded generation.
#[derive(Clone)]
pub struct RetrievalEngine {
    db: Arc<dyn DatabaseBackend>,
    scope: AccessScopeResolver,
    embeddings: EmbeddingProvider,
    reranker: RerankerProvider,
    overfetch_factor: usize,
    vector_timeout: Duration,
}

impl RetrievalEngine {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        embeddings: EmbeddingProvider,
        reranker: RerankerProvider,
        config: &SearchConfig,
    ) -> Self {
        Self {
            scope: AccessScopeResolver::new(db.clone()),
            db,
            embeddings,
            reranker,
            overfetch_factor: config.overfetch_factor.max(1),
            vector_timeout: Duration::from_secs(config.vector_timeout_secs),
        }
    }

    pub fn reranker(&self) -> &RerankerProvider {
        &self.reranker
    }

    /// Up to `n_results` chunks relevant to `query` from the conversation's scope.
    pub async fn search(
        &self,
        query: &str,
        conversation_id: &str,
        n_results: usize,
    ) -> Vec<RetrievalResult> {
        let candidates = self.candidates(query, conversation_id, n_results).await;
        if candidates.is_empty() {
            return Vec::new();
        }

        let results = self
            .reranker
            .rerank_candidates(query, candidates, n_results)
            .await;

        tracing::debug!(conversation_id, results = results.len(), "Retrieval finished");
        results
    }

    /// The over-fetched vector search stage, `n_results * overfetch_factor` at most.
    pub async fn candidates(
        &self,
        query: &str,
        conversation_id: &str,
        n_results: usize,
    ) -> Vec<ChunkCandidate> {
        let allowed = match self.scope.allowed_document_ids(conversation_id).await {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "Failed to resolve retrieval scope");
                return Vec::new();
            }
        };

        if allowed.is_empty() || n_results == 0 {
            tracing::debug!(conversation_id, "No documents in scope, skipping retrieval");
            return Vec::new();
        }

        let embedding = match self.embeddings.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "Query embedding failed, continuing without context");
                return Vec::new();
            }
        };

        let allowed: Vec<String> = allowed.into_iter().collect();
        let limit = n_results * self.overfetch_factor;

        match tokio::time::timeout(
            self.vector_timeout,
            self.db.query_chunks(&embedding, limit, &allowed),
        )
        .await
        {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                tracing::warn!(conversation_id, error = %e, "Vector query failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    conversation_id,
                    timeout_secs = self.vector_timeout.as_secs(),
                    "Vector query timed out"
                );
                Vec::new()
            }
        }
    }
}
