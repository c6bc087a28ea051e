use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::v1;
use super::v1::handlers::chat::{ASSISTANT_MESSAGE_ID_HEADER, USER_MESSAGE_ID_HEADER};
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    let v1 = v1::router::v1_router();

    Router::new()
        .nest("/api/v1", v1)
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browsers only see the message-id headers of a streamed answer when they
/// are exposed explicitly.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(USER_MESSAGE_ID_HEADER),
            HeaderName::from_static(ASSISTANT_MESSAGE_ID_HEADER),
        ])
}
