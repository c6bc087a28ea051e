//! Document group request/response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models;
use crate::services::TrainOutcome;

/// Request body for `POST /v1/groups`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Group name must be 1-255 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Absent until the group has been trained once.
    pub last_trained: Option<DateTime<Utc>>,
    /// True when documents changed since the last training run.
    pub is_stale: bool,
}

impl From<models::DocumentGroup> for GroupResponse {
    fn from(group: models::DocumentGroup) -> Self {
        Self {
            is_stale: group.is_stale(),
            id: group.id,
            name: group.name,
            created_at: group.created_at,
            updated_at: group.updated_at,
            last_trained: group.last_trained,
        }
    }
}

/// Response of `POST /v1/groups/{groupId}/train`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainResponse {
    /// Documents indexed in this run.
    pub processed_count: usize,
    pub total_count: usize,
    pub last_trained: Option<DateTime<Utc>>,
}

impl From<TrainOutcome> for TrainResponse {
    fn from(outcome: TrainOutcome) -> Self {
        Self {
            processed_count: outcome.summary.processed_count,
            total_count: outcome.summary.total_count,
            last_trained: outcome.last_trained,
        }
    }
}
