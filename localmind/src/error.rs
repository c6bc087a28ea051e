use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::v1::response::ApiResponse;

#[derive(Error, Debug)]
pub enum LocalMindError {
    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Chunk/embedding count mismatch: {chunks} chunks, {embeddings} embeddings")]
    IndexMismatch { chunks: usize, embeddings: usize },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unreachable: {0}")]
    LlmUnreachable(String),

    #[error("LLM stream error: {0}")]
    LlmStream(String),

    #[error("Reranker error: {0}")]
    Reranker(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Errors outside a v1 handler body (e.g. extractor rejections) use the same
/// envelope as the handlers themselves.
impl IntoResponse for LocalMindError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type Result<T> = std::result::Result<T, LocalMindError>;
