//! Renderer adapter: normalized HTML in, binary buffer out.
//!
//! Two paths share one seam: PDF through a per-call headless Chromium
//! session, DOCX through an OOXML tree-walk. The `Renderer` trait is the
//! orchestrator's mock point.

mod docx;
mod pdf;

pub use docx::DocxRenderer;
pub use pdf::PdfRenderer;

use crate::error::ConvertResult;
use anuvad_core::OutputFormat;
use async_trait::async_trait;

/// Turns normalized HTML into a binary buffer for the requested format.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, html: &str, format: OutputFormat) -> ConvertResult<Vec<u8>>;
}

/// Production renderer: dispatches to the browser-based PDF path or the
/// OOXML converter. Format validation happens before this is reached, when
/// the request string is parsed into an `OutputFormat`.
pub struct DocumentRenderer {
    pdf: PdfRenderer,
    docx: DocxRenderer,
}

impl DocumentRenderer {
    pub fn new(chromium_path: Option<String>, font_name: impl Into<String>) -> Self {
        let font_name = font_name.into();
        Self {
            pdf: PdfRenderer::new(chromium_path),
            docx: DocxRenderer::new(font_name),
        }
    }
}

#[async_trait]
impl Renderer for DocumentRenderer {
    async fn render(&self, html: &str, format: OutputFormat) -> ConvertResult<Vec<u8>> {
        match format {
            OutputFormat::Pdf => self.pdf.render(html).await,
            OutputFormat::Docx => self.docx.render(html),
        }
    }
}
