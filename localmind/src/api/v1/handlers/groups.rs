//! v1 Document group handlers: CRUD and training.

use axum::extract::{Path, State};
use validator::Validate;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{CreateGroupRequest, DeletedResponse, GroupResponse, TrainResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::error::LocalMindError;

/// `GET /api/v1/groups`
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    tag = "groups",
    operation_id = "groups.list",
    responses(
        (status = 200, description = "Groups, newest first", body = Vec<GroupResponse>),
    )
)]
pub async fn list_groups(State(state): State<AppState>) -> ApiResponse<Vec<GroupResponse>> {
    match state.groups.list().await {
        Ok(groups) => ApiResponse::success(groups.into_iter().map(Into::into).collect()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/groups`
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    tag = "groups",
    operation_id = "groups.create",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn create_group(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateGroupRequest>,
) -> ApiResponse<GroupResponse> {
    if let Err(e) = req.validate() {
        return LocalMindError::from(e).into();
    }

    match state.groups.create(&req.name).await {
        Ok(group) => ApiResponse::created(group.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/groups/{groupId}`
#[utoipa::path(
    get,
    path = "/api/v1/groups/{groupId}",
    tag = "groups",
    operation_id = "groups.get",
    params(("groupId" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group found", body = GroupResponse),
        (status = 404, description = "Group not found", body = ApiError),
    )
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResponse<GroupResponse> {
    match state.groups.get(&group_id).await {
        Ok(group) => ApiResponse::success(group.into()),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/groups/{groupId}`
///
/// Removes the group together with its documents, their chunks and blobs.
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{groupId}",
    tag = "groups",
    operation_id = "groups.delete",
    params(("groupId" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group deleted", body = DeletedResponse),
        (status = 404, description = "Group not found", body = ApiError),
    )
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResponse<DeletedResponse> {
    match state.groups.delete(&group_id).await {
        Ok(()) => ApiResponse::success(DeletedResponse { deleted: true }),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/groups/{groupId}/train`
///
/// Runs indexing synchronously. Documents that fail are skipped and counted
/// out of `processedCount`.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{groupId}/train",
    tag = "groups",
    operation_id = "groups.train",
    params(("groupId" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Training finished", body = TrainResponse),
        (status = 404, description = "Group not found", body = ApiError),
    )
)]
pub async fn train_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResponse<TrainResponse> {
    match state.groups.train(&group_id).await {
        Ok(outcome) => ApiResponse::success(outcome.into()),
        Err(e) => e.into(),
    }
}
