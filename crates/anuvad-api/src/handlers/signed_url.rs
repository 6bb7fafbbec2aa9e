//! Signed-URL endpoints: time-boxed write access for HTML updates and PDF
//! uploads, and read access for stored files. URLs are generated on demand
//! with a 15-minute window and never stored; expiry is the only revocation.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use anuvad_core::constants::{CONTENT_TYPE_HTML, CONTENT_TYPE_PDF};
use anuvad_core::AppError;
use anuvad_storage::keys;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct SignedUrlResponse {
    pub signed_url: String,
    /// Blob path the URL grants access to
    pub path: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HtmlUploadUrlRequest {
    pub project_id: Uuid,
    pub document_id: Uuid,
}

/// Signed write URL for re-uploading a document's edited HTML translation.
/// The blob path is derived from the document record's name, never persisted.
#[utoipa::path(
    put,
    path = "/api/v0/documents/html-upload-url",
    tag = "documents",
    request_body = HtmlUploadUrlRequest,
    responses(
        (status = 200, description = "Signed write URL generated", body = SignedUrlResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        project_id = %request.project_id,
        document_id = %request.document_id,
        operation = "html_upload_url"
    )
)]
pub async fn html_upload_url(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<HtmlUploadUrlRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state
        .db
        .document_repository
        .get_document(request.project_id, request.document_id)
        .await
        .map_err(HttpAppError::from)?
        .ok_or_else(|| AppError::NotFound("File does not exist".to_string()))?;

    let path = keys::html_key(request.project_id, &document.name);
    let signed_url = state
        .documents
        .storage
        .presigned_put_url(&path, CONTENT_TYPE_HTML, state.config.signed_url_ttl())
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(SignedUrlResponse { signed_url, path }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadUrlRequest {
    pub project_id: Uuid,
    pub file_name: String,
}

/// Signed write URL for uploading a new original PDF into a project.
#[utoipa::path(
    post,
    path = "/api/v0/documents/upload-url",
    tag = "documents",
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "Signed write URL generated", body = SignedUrlResponse),
        (status = 400, description = "Invalid file name", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(project_id = %request.project_id, operation = "upload_url")
)]
pub async fn upload_url(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadUrlRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_file_name(&request.file_name)?;

    let path = keys::document_key(request.project_id, &request.file_name);
    let signed_url = state
        .documents
        .storage
        .presigned_put_url(&path, CONTENT_TYPE_PDF, state.config.signed_url_ttl())
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(SignedUrlResponse { signed_url, path }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReadUrlRequest {
    pub project_id: Uuid,
    /// File name without extension; the extension comes from `file_type`
    pub file_name: String,
    /// One of `pdf` or `html`
    pub file_type: String,
}

/// Signed read URL for a stored file (original PDF or HTML translation).
#[utoipa::path(
    post,
    path = "/api/v0/documents/read-url",
    tag = "documents",
    request_body = ReadUrlRequest,
    responses(
        (status = 200, description = "Signed read URL generated", body = SignedUrlResponse),
        (status = 400, description = "Unsupported file type", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(project_id = %request.project_id, file_type = %request.file_type, operation = "read_url")
)]
pub async fn read_url(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ReadUrlRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_file_name(&request.file_name)?;

    match request.file_type.as_str() {
        "pdf" | "html" => {}
        other => {
            return Err(HttpAppError::from(AppError::BadRequest(format!(
                "Unsupported file type: {}",
                other
            ))));
        }
    }

    let file_name = format!("{}.{}", request.file_name, request.file_type);
    let path = keys::document_key(request.project_id, &file_name);
    let signed_url = state
        .documents
        .storage
        .get_presigned_url(&path, state.config.signed_url_ttl())
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(SignedUrlResponse { signed_url, path }))
}

fn validate_file_name(file_name: &str) -> Result<(), HttpAppError> {
    if file_name.is_empty() || file_name.contains("..") || file_name.contains('/') {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "Invalid file name".to_string(),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("judgment-42.pdf").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("../escape.pdf").is_err());
        assert!(validate_file_name("nested/path.pdf").is_err());
    }
}
