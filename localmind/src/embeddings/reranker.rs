use fastembed::{
    RerankInitOptions, RerankResult as FastEmbedRerankResult, RerankerModel, TextRerank,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::RerankerConfig;
use crate::error::{LocalMindError, Result};
use crate::models::{ChunkCandidate, RetrievalResult};

/// Result from reranking operation
#[derive(Debug, Clone)]
pub struct RerankResult {
    pub score: f32,
    pub index: usize,
}

#[derive(Clone)]
enum RerankerBackend {
    Local(Arc<Mutex<TextRerank>>),
    /// Fixed score per candidate position.
    #[cfg(test)]
    Mock(Arc<Vec<f32>>),
    Unavailable { reason: String },
}

/// Cross-encoder reranker wrapping FastEmbed's TextRerank.
///
/// Construction never fails the server: a model that cannot be loaded yields the
/// `Unavailable` variant and retrieval keeps vector order.
#[derive(Clone)]
pub struct RerankerProvider {
    backend: RerankerBackend,
    batch_size: usize,
    timeout: Duration,
}

impl From<FastEmbedRerankResult> for RerankResult {
    fn from(result: FastEmbedRerankResult) -> Self {
        Self {
            score: result.score,
            index: result.index,
        }
    }
}

impl RerankerProvider {
    pub async fn new_async(config: &RerankerConfig, timeout: Duration) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::unavailable("reranker disabled by configuration"));
        }

        let reranker_model = Self::parse_model(&config.model)?;
        let cache_dir = PathBuf::from(&config.cache_dir);

        let model = tokio::task::spawn_blocking(move || {
            TextRerank::try_new(
                RerankInitOptions::new(reranker_model)
                    .with_cache_dir(cache_dir)
                    .with_show_download_progress(true),
            )
        })
        .await
        .map_err(|e| LocalMindError::Reranker(format!("Reranker init task failed: {e}")))?
        .map_err(|e| LocalMindError::Reranker(format!("Failed to initialize reranker: {e}")))?;

        Ok(Self {
            backend: RerankerBackend::Local(Arc::new(Mutex::new(model))),
            batch_size: config.batch_size,
            timeout,
        })
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            backend: RerankerBackend::Unavailable {
                reason: reason.into(),
            },
            batch_size: 64,
            timeout: Duration::from_secs(30),
        }
    }

    fn parse_model(model_name: &str) -> Result<RerankerModel> {
        match model_name {
            "bge-reranker-base" | "BAAI/bge-reranker-base" => Ok(RerankerModel::BGERerankerBase),
            "bge-reranker-v2-m3" | "rozgo/bge-reranker-v2-m3" => {
                Ok(RerankerModel::BGERerankerV2M3)
            }
            "jina-reranker-v1-turbo-en" | "jinaai/jina-reranker-v1-turbo-en" => {
                Ok(RerankerModel::JINARerankerV1TurboEn)
            }
            "jina-reranker-v2-base-multilingual"
            | "jinaai/jina-reranker-v2-base-multilingual" => {
                Ok(RerankerModel::JINARerankerV2BaseMultiligual)
            }
            _ => Err(LocalMindError::Reranker(format!(
                "Unsupported reranker model: {model_name}. Supported models: bge-reranker-base, bge-reranker-v2-m3, jina-reranker-v1-turbo-en, jina-reranker-v2-base-multilingual"
            ))),
        }
    }

    pub fn is_supported_model(model_name: &str) -> bool {
        Self::parse_model(model_name).is_ok()
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, RerankerBackend::Unavailable { .. })
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            RerankerBackend::Unavailable { reason } => Some(reason),
            _ => None,
        }
    }

    /// Score `documents` against `query`, highest score first, truncated to `top_k`.
    pub async fn rerank(
        &self,
        query: &str,
        documents: Vec<String>,
        top_k: usize,
    ) -> Result<Vec<RerankResult>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        match &self.backend {
            RerankerBackend::Local(model) => {
                let model = Arc::clone(model);
                let query = query.to_string();
                let batch_size = self.batch_size;

                let task = tokio::task::spawn_blocking(move || {
                    let mut model = model.blocking_lock();
                    let doc_refs: Vec<&str> = documents.iter().map(|s| s.as_str()).collect();
                    model.rerank(query.as_str(), &doc_refs, false, Some(batch_size))
                });

                let results = tokio::time::timeout(self.timeout, task)
                    .await
                    .map_err(|_| {
                        LocalMindError::Timeout(format!(
                            "Reranking exceeded {}s",
                            self.timeout.as_secs()
                        ))
                    })?
                    .map_err(|e| LocalMindError::Reranker(format!("Rerank task failed: {e}")))?
                    .map_err(|e| LocalMindError::Reranker(format!("Reranking failed: {e}")))?;

                let mut results: Vec<RerankResult> =
                    results.into_iter().map(RerankResult::from).collect();
                results.sort_by(|a, b| b.score.total_cmp(&a.score));
                results.truncate(top_k);
                Ok(results)
            }
            #[cfg(test)]
            RerankerBackend::Mock(scores) => {
                let mut results: Vec<RerankResult> = (0..documents.len())
                    .map(|index| RerankResult {
                        score: scores.get(index).copied().unwrap_or(0.0),
                        index,
                    })
                    .collect();
                results.sort_by(|a, b| b.score.total_cmp(&a.score));
                results.truncate(top_k);
                Ok(results)
            }
            RerankerBackend::Unavailable { reason } => Err(LocalMindError::Reranker(format!(
                "Reranker is not available: {reason}"
            ))),
        }
    }

    /// Order retrieval candidates by relevance, keeping at most `n_results`.
    ///
    /// Falls back to the first `n_results` candidates in vector order, without
    /// scores, when the reranker is unavailable or fails.
    pub async fn rerank_candidates(
        &self,
        query: &str,
        candidates: Vec<ChunkCandidate>,
        n_results: usize,
    ) -> Vec<RetrievalResult> {
        if candidates.is_empty() || n_results == 0 {
            return Vec::new();
        }

        if self.is_available() {
            let documents: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
            match self.rerank(query, documents, n_results).await {
                Ok(ranked) => {
                    return ranked
                        .into_iter()
                        .filter_map(|r| {
                            candidates.get(r.index).map(|c| RetrievalResult {
                                score: Some(r.score),
                                ..RetrievalResult::from(c.clone())
                            })
                        })
                        .collect();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Reranking failed, keeping vector order");
                }
            }
        }

        candidates
            .into_iter()
            .take(n_results)
            .map(RetrievalResult::from)
            .collect()
    }

    /// Fixed per-index scores, for exercising rerank ordering without a model.
    #[cfg(test)]
    pub(crate) fn new_mock(scores: Vec<f32>) -> Self {
        Self {
            backend: RerankerBackend::Mock(Arc::new(scores)),
            batch_size: 64,
            timeout: Duration::from_secs(30),
        }
    }
}
