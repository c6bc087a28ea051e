use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    let groups = Router::new()
        .route(
            "/",
            get(handlers::groups::list_groups).post(handlers::groups::create_group),
        )
        .route(
            "/{groupId}",
            get(handlers::groups::get_group).delete(handlers::groups::delete_group),
        )
        .route(
            "/{groupId}/documents",
            get(handlers::documents::list_documents).post(handlers::documents::upload_document),
        )
        .route("/{groupId}/train", post(handlers::groups::train_group));

    let documents = Router::new().route(
        "/{documentId}",
        delete(handlers::documents::delete_document),
    );

    let conversations = Router::new()
        .route(
            "/",
            get(handlers::conversations::list_conversations)
                .post(handlers::conversations::create_conversation),
        )
        .route(
            "/{conversationId}",
            get(handlers::conversations::get_conversation)
                .delete(handlers::conversations::delete_conversation),
        )
        .route(
            "/{conversationId}/messages",
            get(handlers::conversations::list_messages).post(handlers::chat::send_message),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router())
        .nest("/groups", groups)
        .nest("/documents", documents)
        .nest("/conversations", conversations)
}
