//! Anuvad Core Library
//!
//! This crate provides core domain models, error types, configuration, and shared
//! constants used across all Anuvad components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ConvertedArtifact, Document, DocumentResponse, OutputFormat};
pub use storage_types::StorageBackend;
