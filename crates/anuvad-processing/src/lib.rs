//! Anuvad Processing Library
//!
//! The document conversion pipeline: markup normalization, PDF/DOCX
//! rendering, DOCX package post-processing, streaming ZIP assembly, and the
//! orchestrator tying the stages together per request.

pub mod archive;
pub mod convert;
pub mod error;
pub mod markup;
pub mod package;
pub mod render;

pub use archive::{EntryCompression, ZipStreamWriter};
pub use convert::{ConversionPipeline, DocumentSource, HtmlFetcher};
pub use error::ConvertError;
pub use markup::MarkupNormalizer;
pub use render::{DocumentRenderer, Renderer};
