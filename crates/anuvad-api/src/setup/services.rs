//! Repository and service wiring.

use anyhow::Result;
use anuvad_core::Config;
use anuvad_db::DocumentRepository;
use anuvad_processing::convert::ReqwestHtmlFetcher;
use anuvad_processing::{ConversionPipeline, DocumentRenderer, MarkupNormalizer};
use anuvad_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

use crate::state::{AppState, DbState, DocumentState};

/// Build repositories, the conversion pipeline, and the shared state.
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let document_repository = DocumentRepository::new(pool.clone());
    let http = reqwest::Client::new();

    let renderer = DocumentRenderer::new(
        config.chromium_path().map(String::from),
        config.font_name(),
    );
    let pipeline = ConversionPipeline::new(
        Arc::new(document_repository.clone()),
        storage.clone(),
        Arc::new(ReqwestHtmlFetcher::new(http.clone())),
        Arc::new(renderer),
        MarkupNormalizer::new(config.font_name()),
        config.signed_url_ttl(),
    );

    let state = AppState {
        config: config.clone(),
        db: DbState {
            pool,
            document_repository: document_repository.clone(),
        },
        documents: DocumentState {
            repository: document_repository,
            storage,
            pipeline: Arc::new(pipeline),
            http,
        },
    };

    Ok(Arc::new(state))
}
