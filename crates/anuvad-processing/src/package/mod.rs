//! DOCX package post-processing.

mod docx_patch;

pub use docx_patch::enforce_page_geometry;
