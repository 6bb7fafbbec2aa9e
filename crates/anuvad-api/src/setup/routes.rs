//! Route configuration and setup.

use crate::handlers::{
    blob_delete::delete_file,
    document_download::download_document,
    document_get::{get_document, list_documents},
    download_selected::download_selected,
    health::health,
    signed_url::{html_upload_url, read_url, upload_url},
};
use crate::state::AppState;
use anuvad_core::{Config, StorageBackend};
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// JSON request bodies only; downloads are GET/POST with small payloads.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let api = Router::new()
        .route("/health", get(health))
        .route(
            "/api/v0/projects/{project_id}/documents",
            get(list_documents),
        )
        .route(
            "/api/v0/projects/{project_id}/documents/{document_id}",
            get(get_document),
        )
        .route(
            "/api/v0/projects/{project_id}/documents/{document_id}/download/{format}",
            get(download_document),
        )
        .route(
            "/api/v0/documents/download-selected",
            post(download_selected),
        )
        .route("/api/v0/documents/html-upload-url", put(html_upload_url))
        .route("/api/v0/documents/upload-url", post(upload_url))
        .route("/api/v0/documents/read-url", post(read_url))
        .route("/api/v0/documents", delete(delete_file))
        .with_state(state);

    let mut app = api
        .route("/api/openapi.json", get(crate::api_doc::openapi_json))
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        // Font asset for the rendering engine's @font-face source
        .nest_service("/assets", ServeDir::new(config.font_asset_dir()));

    // Serve local blobs directly in development; "signed" local URLs point here
    if config.storage_backend() == Some(StorageBackend::Local) {
        if let Some(path) = config.local_storage_path() {
            app = app.nest_service("/files", ServeDir::new(path));
        }
    }

    let app = app
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .expose_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {}: {}", origin, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
            .expose_headers([axum::http::header::CONTENT_DISPOSITION])
    };

    Ok(cors)
}
