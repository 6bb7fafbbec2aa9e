use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use anuvad_core::AppError;
use anuvad_storage::keys;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteFileRequest {
    pub project_id: Uuid,
    pub file_name: String,
}

/// Delete a stored blob (original PDF or HTML translation) by name.
#[utoipa::path(
    delete,
    path = "/api/v0/documents",
    tag = "documents",
    request_body = DeleteFileRequest,
    responses(
        (status = 200, description = "File deleted"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(project_id = %request.project_id, operation = "delete_file")
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DeleteFileRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.file_name.is_empty() || request.file_name.contains("..") {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "Invalid file name".to_string(),
        )));
    }

    let path = keys::document_key(request.project_id, &request.file_name);
    state
        .documents
        .storage
        .delete(&path)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(
        serde_json::json!({ "message": "File deleted successfully" }),
    ))
}
