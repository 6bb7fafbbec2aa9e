//! Domain models shared across crates.

pub mod artifact;
pub mod document;

pub use artifact::{ConvertedArtifact, OutputFormat};
pub use document::{Document, DocumentResponse};
