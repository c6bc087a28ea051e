//! v1 Document handlers: multipart upload into a group, listing and deletion.

use axum::extract::{Multipart, Path, State};

use crate::api::v1::dto::{DeletedResponse, DocumentResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;

/// `POST /api/v1/groups/{groupId}/documents`
///
/// Accepts a multipart form with a single `file` field. The extension decides
/// the format; anything but pdf, txt, doc and docx is rejected before storage.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{groupId}/documents",
    tag = "documents",
    operation_id = "documents.upload",
    params(("groupId" = String, Path, description = "Group ID")),
    request_body(content_type = "multipart/form-data", content = String, description = "File upload in the `file` field"),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Missing file or unsupported format", body = ApiError),
        (status = 404, description = "Group not found", body = ApiError),
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResponse<DocumentResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = match field.file_name() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => {
                return ApiResponse::error(ErrorCode::InvalidRequest, "Uploaded file has no name");
            }
        };

        let bytes = match field.bytes().await {
            Ok(b) => b,
            Err(e) => {
                return ApiResponse::error(
                    ErrorCode::InvalidRequest,
                    format!("Failed to read file: {e}"),
                );
            }
        };

        upload = Some((file_name, bytes.to_vec()));
    }

    let Some((file_name, bytes)) = upload else {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Missing required 'file' field");
    };

    match state.documents.upload(&group_id, &file_name, &bytes).await {
        Ok(doc) => ApiResponse::created(doc.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/groups/{groupId}/documents`
#[utoipa::path(
    get,
    path = "/api/v1/groups/{groupId}/documents",
    tag = "documents",
    operation_id = "documents.list",
    params(("groupId" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Documents in upload order", body = Vec<DocumentResponse>),
        (status = 404, description = "Group not found", body = ApiError),
    )
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> ApiResponse<Vec<DocumentResponse>> {
    match state.documents.list(&group_id).await {
        Ok(documents) => ApiResponse::success(documents.into_iter().map(Into::into).collect()),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/documents/{documentId}`
///
/// Deletes the row, every indexed chunk of the document and its stored file.
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{documentId}",
    tag = "documents",
    operation_id = "documents.delete",
    params(("documentId" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted", body = DeletedResponse),
        (status = 404, description = "Document not found", body = ApiError),
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> ApiResponse<DeletedResponse> {
    match state.documents.delete(&document_id).await {
        Ok(()) => ApiResponse::success(DeletedResponse { deleted: true }),
        Err(e) => e.into(),
    }
}
