//! v1 Conversation handlers. Sending a message lives in [`super::chat`].

use axum::extract::{Path, State};
use validator::Validate;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{
    ConversationResponse, ConversationSummaryResponse, CreateConversationRequest, DeletedResponse,
    MessageResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::error::LocalMindError;

/// `GET /api/v1/conversations`
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    tag = "conversations",
    operation_id = "conversations.list",
    responses(
        (status = 200, description = "Conversations, most recently active first", body = Vec<ConversationSummaryResponse>),
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
) -> ApiResponse<Vec<ConversationSummaryResponse>> {
    match state.conversations.list().await {
        Ok(list) => ApiResponse::success(list.into_iter().map(Into::into).collect()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/conversations`
#[utoipa::path(
    post,
    path = "/api/v1/conversations",
    tag = "conversations",
    operation_id = "conversations.create",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse),
        (status = 400, description = "Invalid request or unknown group ids", body = ApiError),
    )
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateConversationRequest>,
) -> ApiResponse<ConversationResponse> {
    if let Err(e) = req.validate() {
        return LocalMindError::from(e).into();
    }

    match state
        .conversations
        .create(&req.title, req.conv_type, &req.group_ids)
        .await
    {
        Ok((conversation, group_ids)) => {
            ApiResponse::created(ConversationResponse::new(conversation, group_ids))
        }
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/conversations/{conversationId}`
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{conversationId}",
    tag = "conversations",
    operation_id = "conversations.get",
    params(("conversationId" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation with its linked groups", body = ConversationResponse),
        (status = 404, description = "Conversation not found", body = ApiError),
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> ApiResponse<ConversationResponse> {
    match state.conversations.get(&conversation_id).await {
        Ok((conversation, group_ids)) => {
            ApiResponse::success(ConversationResponse::new(conversation, group_ids))
        }
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/conversations/{conversationId}`
#[utoipa::path(
    delete,
    path = "/api/v1/conversations/{conversationId}",
    tag = "conversations",
    operation_id = "conversations.delete",
    params(("conversationId" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation deleted", body = DeletedResponse),
        (status = 404, description = "Conversation not found", body = ApiError),
    )
)]
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> ApiResponse<DeletedResponse> {
    match state.conversations.delete(&conversation_id).await {
        Ok(()) => ApiResponse::success(DeletedResponse { deleted: true }),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/conversations/{conversationId}/messages`
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{conversationId}/messages",
    tag = "conversations",
    operation_id = "conversations.messages",
    params(("conversationId" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Messages in creation order", body = Vec<MessageResponse>),
        (status = 404, description = "Conversation not found", body = ApiError),
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> ApiResponse<Vec<MessageResponse>> {
    match state.conversations.messages(&conversation_id).await {
        Ok(messages) => ApiResponse::success(messages.into_iter().map(Into::into).collect()),
        Err(e) => e.into(),
    }
}
