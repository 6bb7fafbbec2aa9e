//! Application state.
//!
//! AppState is split into domain sub-states so handlers reach only for what
//! they need and setup stays readable: database things in `DbState`, the
//! document conversion surface in `DocumentState`.

use anuvad_core::Config;
use anuvad_db::DocumentRepository;
use anuvad_processing::ConversionPipeline;
use anuvad_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Database pool and repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub document_repository: DocumentRepository,
}

/// Blob store, conversion pipeline, and the shared HTTP client used to fetch
/// signed URLs when assembling download archives.
#[derive(Clone)]
pub struct DocumentState {
    pub repository: DocumentRepository,
    pub storage: Arc<dyn Storage>,
    pub pipeline: Arc<ConversionPipeline>,
    pub http: reqwest::Client,
}

pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub documents: DocumentState,
}
