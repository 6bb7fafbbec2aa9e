//! Single-document download: convert the HTML translation, then stream a ZIP
//! holding the converted artifact and the original PDF.

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::zip_response::{append_original_pdf, zip_response};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use anuvad_core::{ConvertedArtifact, OutputFormat};
use anuvad_processing::{ConvertError, EntryCompression, ZipStreamWriter};
use std::sync::Arc;
use uuid::Uuid;

/// Serves `/download/docx` and `/download/pdf`; any other format value is
/// rejected before conversion work starts.
#[utoipa::path(
    get,
    path = "/api/v0/projects/{project_id}/documents/{document_id}/download/{format}",
    tag = "documents",
    params(
        ("project_id" = Uuid, Path, description = "Project ID"),
        ("document_id" = Uuid, Path, description = "Document ID"),
        ("format" = String, Path, description = "Conversion target: pdf or docx")
    ),
    responses(
        (status = 200, description = "ZIP with converted file and original PDF", content_type = "application/zip"),
        (status = 400, description = "Unsupported conversion format", body = ErrorResponse),
        (status = 404, description = "Document or HTML translation not found", body = ErrorResponse),
        (status = 500, description = "Conversion or packaging failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state),
    fields(
        project_id = %project_id,
        document_id = %document_id,
        format = %format,
        operation = "download_document"
    )
)]
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path((project_id, document_id, format)): Path<(Uuid, Uuid, String)>,
) -> Result<impl IntoResponse, HttpAppError> {
    // Fail fast on anything outside {pdf, docx}
    let format: OutputFormat = format.parse().map_err(HttpAppError::from)?;

    // Convert before any body bytes flow so failures map to clean statuses
    let artifact = state
        .documents
        .pipeline
        .convert_document(project_id, document_id, format)
        .await
        .map_err(HttpAppError::from)?;

    // Fresh read-signed URL for the original, generated at point of use
    let pdf_signed_url = state
        .documents
        .storage
        .get_presigned_url(&artifact.original_key, state.config.signed_url_ttl())
        .await
        .map_err(|e| {
            HttpAppError::from(ConvertError::UpstreamFetchFailed(format!(
                "Could not sign original PDF URL: {}",
                e
            )))
        })?;

    let archive_name = format!("{}.zip", artifact.original_name.trim_end_matches(".pdf"));

    // Converted DOCX packages deflate well; a converted PDF is already
    // compressed and goes in stored, like the original
    let artifact_compression = match format {
        OutputFormat::Docx => EntryCompression::Text(state.config.zip_text_compression_level()),
        OutputFormat::Pdf => EntryCompression::Binary,
    };

    let (writer, rx) = ZipStreamWriter::new();
    let http = state.documents.http.clone();
    tokio::spawn(stream_archive(
        writer,
        artifact,
        artifact_compression,
        http,
        pdf_signed_url,
    ));

    zip_response(&archive_name, rx).map_err(HttpAppError::from)
}

/// Producer task: runs to completion even if the client goes away (no
/// cancellation propagation); an error drops the writer, aborting the stream
/// without a ZIP terminator.
async fn stream_archive(
    mut writer: ZipStreamWriter,
    artifact: ConvertedArtifact,
    artifact_compression: EntryCompression,
    http: reqwest::Client,
    pdf_signed_url: String,
) {
    let result: Result<(), ConvertError> = async {
        writer.add_entry(&artifact.file_name, &artifact.data, artifact_compression)?;
        append_original_pdf(&mut writer, &http, &pdf_signed_url, &artifact.original_name).await?;
        writer.finish()
    }
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "download archive aborted");
    }
}
