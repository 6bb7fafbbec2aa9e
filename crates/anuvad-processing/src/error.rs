//! Conversion pipeline errors.
//!
//! Every stage raises its own condition and nothing retries internally; the
//! orchestrator propagates the first failure unchanged to the HTTP layer,
//! which owns status-code mapping.

use anuvad_core::AppError;
use anuvad_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Missing metadata record or missing HTML blob.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The HTML fetch succeeded but returned empty/absent content.
    #[error("HTML content is empty or undefined: {0}")]
    ContentUnavailable(String),

    /// Requested conversion target not in {pdf, docx}.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Renderer or converter library error, original message preserved.
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    /// Archive-writer error or OOXML patch failure.
    #[error("Packaging failed: {0}")]
    PackagingFailed(String),

    /// Signed-URL fetch of an upstream blob failed.
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetchFailed(String),

    /// Blob-store error outside the not-found case.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Metadata-store lookup failure.
    #[error("Metadata error: {0}")]
    Metadata(#[source] AppError),
}

pub type ConvertResult<T> = Result<T, ConvertError>;
