//! Storage abstraction trait
//!
//! This module defines the Storage trait that all blob-store backends must
//! implement: byte-level get/put/delete plus time-limited signed URLs.

use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All blob-store backends (S3, local filesystem) implement this trait so the
/// conversion pipeline and the HTTP handlers never couple to a specific
/// provider.
///
/// **Path format:** paths are project-scoped (`projects/{project_id}/{file}`)
/// and produced by the `keys` module. See the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Download a blob by its path
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Upload data to a specific blob path, overwriting any existing object.
    async fn upload_with_key(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Delete a blob by its path
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Check if a blob exists
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Size in bytes of a blob, if it exists.
    async fn content_length(&self, path: &str) -> StorageResult<u64>;

    /// Generate a signed GET URL granting read access to one blob for the
    /// given window. Generated at point of use, never stored; expiry is the
    /// only revocation mechanism.
    async fn get_presigned_url(&self, path: &str, expires_in: Duration) -> StorageResult<String>;

    /// Generate a signed PUT URL for a direct upload with the given content
    /// type. Only supported by S3 backends; others return a `ConfigError`.
    async fn presigned_put_url(
        &self,
        path: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
