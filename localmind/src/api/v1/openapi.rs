use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LocalMind API",
        version = "1.0.0",
        description = "Local retrieval-augmented chat over your own documents.",
    ),
    paths(
        handlers::health::health_check,
        handlers::groups::list_groups,
        handlers::groups::create_group,
        handlers::groups::get_group,
        handlers::groups::delete_group,
        handlers::groups::train_group,
        handlers::documents::upload_document,
        handlers::documents::list_documents,
        handlers::documents::delete_document,
        handlers::conversations::list_conversations,
        handlers::conversations::create_conversation,
        handlers::conversations::get_conversation,
        handlers::conversations::delete_conversation,
        handlers::conversations::list_messages,
        handlers::chat::send_message,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        dto::DeletedResponse,
        // Groups
        dto::groups::CreateGroupRequest,
        dto::groups::GroupResponse,
        dto::groups::TrainResponse,
        // Documents
        dto::documents::DocumentResponse,
        crate::models::DocumentFormat,
        // Conversations
        dto::conversations::CreateConversationRequest,
        dto::conversations::SendMessageRequest,
        dto::conversations::ConversationResponse,
        dto::conversations::ConversationSummaryResponse,
        dto::conversations::MessageResponse,
        crate::models::ConversationType,
        crate::models::MessageSender,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::EmbeddingsStatus,
        handlers::health::LlmStatus,
        handlers::health::RerankerStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "groups", description = "Document groups and training"),
        (name = "documents", description = "Document upload, listing and deletion"),
        (name = "conversations", description = "Conversations, message history and streamed chat"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
