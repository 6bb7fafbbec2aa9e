//! OpenAPI documentation.

use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::download_selected::DownloadSelectedRequest;
use crate::handlers::signed_url::{
    HtmlUploadUrlRequest, ReadUrlRequest, SignedUrlResponse, UploadUrlRequest,
};
use anuvad_core::models::DocumentResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health,
        crate::handlers::document_get::get_document,
        crate::handlers::document_get::list_documents,
        crate::handlers::document_download::download_document,
        crate::handlers::download_selected::download_selected,
        crate::handlers::signed_url::html_upload_url,
        crate::handlers::signed_url::upload_url,
        crate::handlers::signed_url::read_url,
        crate::handlers::blob_delete::delete_file,
    ),
    components(schemas(
        DocumentResponse,
        ErrorResponse,
        SignedUrlResponse,
        HtmlUploadUrlRequest,
        UploadUrlRequest,
        ReadUrlRequest,
        DownloadSelectedRequest,
    )),
    tags(
        (name = "documents", description = "Document conversion and download endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
