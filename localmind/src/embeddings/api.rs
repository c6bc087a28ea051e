use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LocalMindError, Result};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Client for the Ollama `/api/embeddings` endpoint: one prompt per request.
#[derive(Clone)]
pub struct EmbeddingApiClient {
    client: Client,
    config: ApiConfig,
}

impl EmbeddingApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(LocalMindError::Embedding(
                "Embedding base URL is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LocalMindError::Embedding(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            prompt: text,
        };

        let url = format!(
            "{}/api/embeddings",
            self.config.base_url.trim_end_matches('/')
        );

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            let response = self.client.post(&url).json(&request).send().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let body: EmbeddingResponse = resp.json().await.map_err(|e| {
                            LocalMindError::Embedding(format!("Failed to parse response: {e}"))
                        })?;
                        if body.embedding.is_empty() {
                            return Err(LocalMindError::Embedding(
                                "Embedding server returned an empty vector".to_string(),
                            ));
                        }
                        return Ok(body.embedding);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
                    {
                        let body = resp.text().await.unwrap_or_default();
                        last_error = Some(LocalMindError::Embedding(format!(
                            "Server error {status}: {body}"
                        )));
                        continue;
                    }

                    let body = resp.text().await.unwrap_or_default();
                    return Err(LocalMindError::Embedding(format!(
                        "API error {status}: {body}"
                    )));
                }
                Err(e) if e.is_timeout() => {
                    last_error = Some(LocalMindError::Timeout(format!(
                        "Embedding request timed out: {e}"
                    )));
                    continue;
                }
                Err(e) => {
                    last_error = Some(LocalMindError::Embedding(format!("Request failed: {e}")));
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LocalMindError::Embedding("Unknown error".to_string())))
    }

    /// Embed a probe string to learn the model's vector width.
    pub async fn detect_dimensions(&self) -> Result<usize> {
        Ok(self.embed("dimension probe").await?.len())
    }
}
