//! Multi-document download: one streaming ZIP, one folder per document.
//!
//! Documents are processed strictly sequentially; the archive writer is a
//! single ordered sink and must not receive concurrent writes. Every record
//! is resolved before the response starts streaming so unknown ids map to a
//! clean 404; failures after that abort the connection.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::zip_response::{append_original_pdf, zip_response};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use anuvad_core::{AppError, Document, OutputFormat};
use anuvad_processing::archive::sanitize_entry_component;
use anuvad_processing::{ConvertError, EntryCompression, ZipStreamWriter};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const ARCHIVE_NAME: &str = "selected_files.zip";

#[derive(Debug, Deserialize, ToSchema)]
pub struct DownloadSelectedRequest {
    pub project_id: Uuid,
    pub document_ids: Vec<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/v0/documents/download-selected",
    tag = "documents",
    request_body = DownloadSelectedRequest,
    responses(
        (status = 200, description = "ZIP with one folder per document", content_type = "application/zip"),
        (status = 400, description = "Empty or oversized selection", body = ErrorResponse),
        (status = 404, description = "A selected document does not exist", body = ErrorResponse),
        (status = 500, description = "Conversion or packaging failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        project_id = %request.project_id,
        document_count = request.document_ids.len(),
        operation = "download_selected"
    )
)]
pub async fn download_selected(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DownloadSelectedRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.document_ids.is_empty() {
        return Err(HttpAppError::from(AppError::BadRequest(
            "document_ids must not be empty".to_string(),
        )));
    }
    let max = state.config.max_selected_downloads();
    if request.document_ids.len() > max {
        return Err(HttpAppError::from(AppError::BadRequest(format!(
            "At most {} documents per download",
            max
        ))));
    }

    // Resolve every record up front: unknown ids become a clean 404 instead
    // of an aborted stream
    let mut documents = Vec::with_capacity(request.document_ids.len());
    for document_id in &request.document_ids {
        let document = state
            .db
            .document_repository
            .get_document(request.project_id, *document_id)
            .await
            .map_err(HttpAppError::from)?
            .ok_or_else(|| {
                HttpAppError::from(AppError::NotFound(format!(
                    "Document not found: {}",
                    document_id
                )))
            })?;
        documents.push(document);
    }

    let (writer, rx) = ZipStreamWriter::new();
    tokio::spawn(stream_selected(
        state.clone(),
        request.project_id,
        documents,
        writer,
    ));

    zip_response(ARCHIVE_NAME, rx).map_err(HttpAppError::from)
}

/// Producer: converts and appends each document in input order. Any failure
/// drops the writer mid-archive; the entries already written never become a
/// valid ZIP.
async fn stream_selected(
    state: Arc<AppState>,
    project_id: Uuid,
    documents: Vec<Document>,
    mut writer: ZipStreamWriter,
) {
    let compression = EntryCompression::Text(state.config.zip_text_compression_level());

    let result: Result<(), ConvertError> = async {
        for document in &documents {
            let artifact = state
                .documents
                .pipeline
                .convert_document(project_id, document.id, OutputFormat::Docx)
                .await?;

            let folder = sanitize_entry_component(document.base_name(), "document");
            writer.add_entry(
                &format!("{}/{}", folder, artifact.file_name),
                &artifact.data,
                compression,
            )?;

            // A fresh signed URL per document, requested immediately before
            // use; URLs are never reused across entries
            let pdf_signed_url = state
                .documents
                .storage
                .get_presigned_url(&artifact.original_key, state.config.signed_url_ttl())
                .await
                .map_err(|e| {
                    ConvertError::UpstreamFetchFailed(format!(
                        "Could not sign original PDF URL: {}",
                        e
                    ))
                })?;

            append_original_pdf(
                &mut writer,
                &state.documents.http,
                &pdf_signed_url,
                &format!("{}/{}", folder, artifact.original_name),
            )
            .await?;
        }
        writer.finish()
    }
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "selected-files archive aborted");
    }
}
