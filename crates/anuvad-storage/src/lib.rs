//! Anuvad Storage Library
//!
//! This crate provides the blob-store abstraction and implementations for
//! Anuvad. It includes the Storage trait plus S3 and local filesystem backends.
//!
//! # Blob path format
//!
//! All blobs are project-scoped. Every backend uses the same path layout:
//!
//! - **Original PDF**: `projects/{project_id}/{name}.pdf`
//! - **HTML translation**: `projects/{project_id}/{name}.html`
//!
//! Paths must not contain `..` or a leading `/`. Path generation is
//! centralized in the `keys` module so backends and callers stay consistent:
//! paths are reconstructed from the document record on every request and
//! never persisted.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use anuvad_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
