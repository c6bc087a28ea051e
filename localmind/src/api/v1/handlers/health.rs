use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub embeddings: EmbeddingsStatus,
    pub llm: LlmStatus,
    pub reranker: RerankerStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DatabaseStatus {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EmbeddingsStatus {
    pub status: String,
    pub model: String,
    pub dimensions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmStatus {
    pub status: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RerankerStatus {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub status: String,
}

/// `GET /api/v1/health`
///
/// Reports configuration and availability without calling the language model.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    operation_id = "health.check",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let db_status = match state.db.sync().await {
        Ok(_) => DatabaseStatus {
            status: "ok".to_string(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            DatabaseStatus {
                status: "error".to_string(),
            }
        }
    };

    let embeddings_status = EmbeddingsStatus {
        status: if state.embeddings.is_available() {
            "available"
        } else {
            "unavailable"
        }
        .to_string(),
        model: state.config.embeddings.model.clone(),
        dimensions: state.embeddings.dimensions(),
        reason: state.embeddings.unavailable_reason().map(str::to_string),
    };

    let client = state.chat.client();
    let llm_status = LlmStatus {
        status: "configured".to_string(),
        model: client.model().to_string(),
        base_url: client.base_url().to_string(),
    };

    let reranker = state.retrieval.reranker();
    let reranker_status = match &state.config.reranker {
        None => RerankerStatus {
            enabled: false,
            model: None,
            status: "disabled".to_string(),
        },
        Some(cfg) if reranker.is_available() => RerankerStatus {
            enabled: true,
            model: Some(cfg.model.clone()),
            status: "ready".to_string(),
        },
        Some(cfg) => RerankerStatus {
            enabled: false,
            model: Some(cfg.model.clone()),
            status: "unavailable".to_string(),
        },
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        embeddings: embeddings_status,
        llm: llm_status,
        reranker: reranker_status,
    })
}
