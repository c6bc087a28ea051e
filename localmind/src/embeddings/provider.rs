use futures::stream::{self, StreamExt};

use super::api::{ApiConfig, EmbeddingApiClient};
use crate::config::EmbeddingsConfig;
use crate::error::{LocalMindError, Result};

#[derive(Clone)]
enum EmbeddingBackend {
    Remote(EmbeddingApiClient),
    Unavailable { reason: String },
}

/// Text-to-vector conversion backed by a remote embedding model.
#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: EmbeddingBackend,
    dimensions: usize,
    concurrency: usize,
}

impl EmbeddingProvider {
    /// Build a provider for the configured server. A configuration that cannot
    /// produce a client yields the `Unavailable` variant instead of an error.
    pub fn new(config: &EmbeddingsConfig) -> Self {
        let api_config = ApiConfig {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        };

        let backend = match EmbeddingApiClient::new(api_config) {
            Ok(client) => EmbeddingBackend::Remote(client),
            Err(e) => {
                tracing::warn!(error = %e, "Embedding provider unavailable");
                EmbeddingBackend::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        Self {
            backend,
            dimensions: config.dimensions,
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn unavailable(reason: impl Into<String>, dimensions: usize) -> Self {
        Self {
            backend: EmbeddingBackend::Unavailable {
                reason: reason.into(),
            },
            dimensions,
            concurrency: 1,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.backend, EmbeddingBackend::Remote(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            EmbeddingBackend::Unavailable { reason } => Some(reason),
            EmbeddingBackend::Remote(_) => None,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Default in-flight request limit for [`embed_many`](Self::embed_many).
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn model(&self) -> Option<&str> {
        match &self.backend {
            EmbeddingBackend::Remote(client) => Some(client.model()),
            EmbeddingBackend::Unavailable { .. } => None,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match &self.backend {
            EmbeddingBackend::Remote(client) => {
                let embedding = client.embed(text).await?;
                if embedding.len() != self.dimensions {
                    return Err(LocalMindError::Embedding(format!(
                        "Expected {} dimensions, embedding server returned {}",
                        self.dimensions,
                        embedding.len()
                    )));
                }
                Ok(embedding)
            }
            EmbeddingBackend::Unavailable { reason } => {
                Err(LocalMindError::EmbeddingUnavailable(reason.clone()))
            }
        }
    }

    /// Embed every text with at most `concurrency` requests in flight.
    ///
    /// Output position `i` always holds the outcome for `texts[i]`; failures stay in
    /// place as `Err` so callers can tell exactly which inputs were lost.
    pub async fn embed_many(
        &self,
        texts: &[String],
        concurrency: usize,
    ) -> Vec<Result<Vec<f32>>> {
        let limit = concurrency.max(1);

        let completed: Vec<(usize, Result<Vec<f32>>)> = stream::iter(0..texts.len())
            .map(|index| async move { (index, self.embed(&texts[index]).await) })
            .buffer_unordered(limit)
            .collect()
            .await;

        let mut slots: Vec<Option<Result<Vec<f32>>>> = texts.iter().map(|_| None).collect();
        for (index, outcome) in completed {
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(LocalMindError::Internal(
                        "Embedding task produced no result".to_string(),
                    ))
                })
            })
            .collect()
    }

    /// Ask the server for one embedding and report its width.
    pub async fn probe(&self) -> Result<usize> {
        match &self.backend {
            EmbeddingBackend::Remote(client) => client.detect_dimensions().await,
            EmbeddingBackend::Unavailable { reason } => {
                Err(LocalMindError::EmbeddingUnavailable(reason.clone()))
            }
        }
    }
}
