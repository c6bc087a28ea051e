//! # V1 API Response Envelope & Error Contract
//!
//! Every JSON endpoint returns an [`ApiResponse<T>`] envelope:
//!
//! ```json
//! {
//!   "data": { ... },                                   // present on success
//!   "error": { "code": "not_found", "message": "..." } // present on error
//! }
//! ```
//!
//! The streamed chat endpoint is the one exception: its success body is raw
//! `text/plain` tokens. Its failures before the first token still use this
//! envelope.
//!
//! All ids (groups, documents, conversations, messages) are UUID v4 strings.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::LocalMindError;

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed request or failed validation (e.g. unsupported file format). HTTP 400.
    InvalidRequest,
    /// The requested resource does not exist. HTTP 404.
    NotFound,
    /// Unexpected server-side error. Details are logged, never returned. HTTP 500.
    InternalError,
    /// The language model or embedding server answered with an error. HTTP 502.
    UpstreamError,
    /// The language model or embedding server cannot be reached. HTTP 503.
    BackendUnreachable,
    /// An upstream call exceeded its deadline. HTTP 504.
    Timeout,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::BackendUnreachable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::NotFound => write!(f, "not_found"),
            Self::InternalError => write!(f, "internal_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::BackendUnreachable => write!(f, "backend_unreachable"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

/// Canonical v1 API response envelope.
///
/// On success `data` is present and `error` is absent; on error the reverse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Resource created response (HTTP 201).
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::CREATED,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<LocalMindError> for ApiResponse<T> {
    /// Convert a [`LocalMindError`] into a v1 [`ApiResponse`].
    ///
    /// Internal error details are **never** leaked to the client. For
    /// `internal_error` responses a generic message is returned and the real
    /// error is logged.
    fn from(err: LocalMindError) -> Self {
        match err {
            LocalMindError::NotFound(ref msg) => {
                ApiResponse::error(ErrorCode::NotFound, msg.clone())
            }

            LocalMindError::Validation(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            LocalMindError::Json(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }

            LocalMindError::LlmUnreachable(ref msg) => {
                ApiResponse::error(ErrorCode::BackendUnreachable, msg.clone())
            }

            LocalMindError::EmbeddingUnavailable(ref msg) => ApiResponse::error(
                ErrorCode::BackendUnreachable,
                format!("Embedding server unavailable: {msg}"),
            ),

            ref upstream @ (LocalMindError::Llm(_)
            | LocalMindError::LlmStream(_)
            | LocalMindError::Embedding(_)) => {
                tracing::warn!(error = %upstream, "Upstream error mapped to v1 response");
                ApiResponse::error(ErrorCode::UpstreamError, upstream.to_string())
            }

            LocalMindError::Timeout(ref msg) => ApiResponse::error(ErrorCode::Timeout, msg.clone()),

            ref internal @ (LocalMindError::Database(_)
            | LocalMindError::Processing(_)
            | LocalMindError::IndexMismatch { .. }
            | LocalMindError::Http(_)
            | LocalMindError::Io(_)
            | LocalMindError::Internal(_)
            | LocalMindError::Reranker(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}
