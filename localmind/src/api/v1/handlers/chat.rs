//! Streamed chat endpoint.
//!
//! The success body is plain UTF-8 text written token by token, with no
//! framing. Failures before the first token use the JSON envelope; a failure
//! after it aborts the body.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderName};
use axum::response::{IntoResponse, Response};
use validator::Validate;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::SendMessageRequest;
use crate::api::v1::response::ApiError;
use crate::api::AppState;
use crate::error::LocalMindError;

pub const USER_MESSAGE_ID_HEADER: &str = "x-user-message-id";
pub const ASSISTANT_MESSAGE_ID_HEADER: &str = "x-assistant-message-id";

/// `POST /api/v1/conversations/{conversationId}/messages`
#[utoipa::path(
    post,
    path = "/api/v1/conversations/{conversationId}/messages",
    tag = "conversations",
    operation_id = "conversations.sendMessage",
    params(("conversationId" = String, Path, description = "Conversation ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Answer streamed as plain text; message ids in the x-user-message-id and x-assistant-message-id headers", content_type = "text/plain", body = String),
        (status = 400, description = "Empty message", body = ApiError),
        (status = 404, description = "Conversation not found", body = ApiError),
        (status = 502, description = "Language model returned an error", body = ApiError),
        (status = 503, description = "Language model unreachable", body = ApiError),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    AppJson(req): AppJson<SendMessageRequest>,
) -> Response {
    if let Err(e) = req.validate() {
        return LocalMindError::from(e).into_response();
    }

    let exchange = match state.chat.start_exchange(&conversation_id, &req.text).await {
        Ok(exchange) => exchange,
        Err(e) => return e.into_response(),
    };

    tracing::debug!(
        conversation_id = %conversation_id,
        user_message_id = %exchange.user_message_id,
        assistant_message_id = %exchange.assistant_message_id,
        "Streaming answer"
    );

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (header::CACHE_CONTROL, "no-cache".to_string()),
        (
            HeaderName::from_static(USER_MESSAGE_ID_HEADER),
            exchange.user_message_id,
        ),
        (
            HeaderName::from_static(ASSISTANT_MESSAGE_ID_HEADER),
            exchange.assistant_message_id,
        ),
    ];

    (headers, Body::from_stream(exchange.tokens)).into_response()
}
