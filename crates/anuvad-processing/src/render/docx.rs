//! HTML to OOXML conversion.
//!
//! A tree-walk over the normalized kuchiki DOM emitting `docx-rs` structures.
//! The document is configured for legal pages (12240 x 20160 twips), 1-inch
//! margins, the platform font with a sans-serif fallback, and 120/360
//! paragraph spacing; the package post-processor re-asserts page size and
//! line spacing afterwards in case the converter output drifts.

use base64::Engine;
use docx_rs::{
    AlignmentType, BreakType, Docx, LineSpacing, LineSpacingType, PageMargin, Paragraph, Pic, Run,
    RunFonts, Style, StyleType, Table, TableCell, TableRow,
};
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeData, NodeRef};

use crate::error::{ConvertError, ConvertResult};
use anuvad_core::constants::{
    LEGAL_PAGE_HEIGHT_TWIPS, LEGAL_PAGE_WIDTH_TWIPS, LINE_SPACING_TWIPS, PAGE_MARGIN_TWIPS,
    PARAGRAPH_SPACING_AFTER_TWIPS,
};

/// EMU dimensions used when an embedded image carries no usable size.
const FALLBACK_IMAGE_WIDTH_EMU: u32 = 4_000_000;
const FALLBACK_IMAGE_HEIGHT_EMU: u32 = 3_000_000;

pub struct DocxRenderer {
    font_name: String,
}

impl DocxRenderer {
    pub fn new(font_name: impl Into<String>) -> Self {
        Self {
            font_name: font_name.into(),
        }
    }

    /// Convert normalized HTML into a DOCX buffer.
    pub fn render(&self, html: &str) -> ConvertResult<Vec<u8>> {
        let document = kuchiki::parse_html().one(html);
        let body = document.select_first("body").map_err(|()| {
            ConvertError::ConversionFailed("parsed document has no body".to_string())
        })?;

        let mut converter = DocxConverter::new(&self.font_name);
        for child in body.as_node().children() {
            converter.process_node(&child, RunFormat::default())?;
        }
        converter.finish()
    }
}

/// Inline formatting carried down the walk.
#[derive(Debug, Clone, Copy, Default)]
struct RunFormat {
    bold: bool,
    italic: bool,
    underline: bool,
}

impl RunFormat {
    fn with_style_attr(mut self, style: &str) -> Self {
        if style.contains("font-weight: bold") || style.contains("font-weight:bold") {
            self.bold = true;
        }
        if style.contains("font-style: italic") || style.contains("font-style:italic") {
            self.italic = true;
        }
        if style.contains("text-decoration: underline") || style.contains("text-decoration:underline")
        {
            self.underline = true;
        }
        self
    }
}

struct DocxConverter {
    docx: Docx,
    current_paragraph: Option<Paragraph>,
    paragraph_has_content: bool,
    pending_page_break: bool,
}

impl DocxConverter {
    fn new(font_name: &str) -> Self {
        let fonts = RunFonts::new()
            .ascii(font_name)
            .hi_ansi(font_name)
            .east_asia(font_name)
            .cs(font_name);

        let mut docx = Docx::new()
            .page_size(LEGAL_PAGE_WIDTH_TWIPS, LEGAL_PAGE_HEIGHT_TWIPS)
            .page_margin(
                PageMargin::new()
                    .top(PAGE_MARGIN_TWIPS as i32)
                    .bottom(PAGE_MARGIN_TWIPS as i32)
                    .left(PAGE_MARGIN_TWIPS as i32)
                    .right(PAGE_MARGIN_TWIPS as i32),
            )
            .default_fonts(fonts)
            .default_size(24);

        for (level, size) in [(1, 32), (2, 28), (3, 26), (4, 24), (5, 22), (6, 20)] {
            docx = docx.add_style(
                Style::new(format!("Heading{}", level), StyleType::Paragraph)
                    .name(format!("Heading {}", level))
                    .size(size)
                    .bold(),
            );
        }

        Self {
            docx,
            current_paragraph: None,
            paragraph_has_content: false,
            pending_page_break: false,
        }
    }

    fn base_paragraph() -> Paragraph {
        Paragraph::new().line_spacing(
            LineSpacing::new()
                .after(PARAGRAPH_SPACING_AFTER_TWIPS)
                .line(LINE_SPACING_TWIPS as i32)
                .line_rule(LineSpacingType::Auto),
        )
    }

    fn process_node(&mut self, node: &NodeRef, fmt: RunFormat) -> ConvertResult<()> {
        match node.data() {
            NodeData::Text(text) => {
                let text = text.borrow();
                // Keep nbsp-only runs (indent padding); drop inter-tag whitespace
                if !text.trim().is_empty() || text.contains('\u{a0}') {
                    self.add_text(&text, fmt);
                }
                Ok(())
            }
            NodeData::Element(element) => self.process_element(node, element, fmt),
            _ => Ok(()),
        }
    }

    fn process_element(
        &mut self,
        node: &NodeRef,
        element: &ElementData,
        fmt: RunFormat,
    ) -> ConvertResult<()> {
        let style_attr = element
            .attributes
            .borrow()
            .get("style")
            .map(str::to_string)
            .unwrap_or_default();

        match &*element.name.local {
            "head" | "script" | "style" | "title" => Ok(()),

            "p" => self.process_block(node, fmt, None, &style_attr),

            "div" => {
                if style_attr.contains("page-break-after") || style_attr.contains("page-break-before")
                {
                    self.flush_paragraph();
                    self.pending_page_break = true;
                    Ok(())
                } else {
                    // Containers (line-height wrapper included) pass through
                    self.process_children(node, fmt)
                }
            }

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = &element.name.local[1..];
                let style = format!("Heading{}", level);
                self.process_block(node, RunFormat { bold: true, ..fmt }, Some(style), &style_attr)
            }

            "br" => {
                let run = self.styled_run(fmt).add_break(BreakType::TextWrapping);
                self.append_run(run);
                Ok(())
            }

            "em" | "i" => self.process_children(node, RunFormat { italic: true, ..fmt }),
            "strong" | "b" => self.process_children(node, RunFormat { bold: true, ..fmt }),
            "u" => self.process_children(node, RunFormat { underline: true, ..fmt }),

            "span" => self.process_children(node, fmt.with_style_attr(&style_attr)),

            "table" => self.process_table(node),

            "img" => {
                self.process_image(element);
                Ok(())
            }

            "ul" | "ol" | "li" | "blockquote" => {
                // Rendered as plain paragraphs; the editor emits lists rarely
                self.process_block(node, fmt, None, &style_attr)
            }

            _ => self.process_children(node, fmt),
        }
    }

    fn process_children(&mut self, node: &NodeRef, fmt: RunFormat) -> ConvertResult<()> {
        for child in node.children() {
            self.process_node(&child, fmt)?;
        }
        Ok(())
    }

    /// One paragraph per block element.
    fn process_block(
        &mut self,
        node: &NodeRef,
        fmt: RunFormat,
        style: Option<String>,
        style_attr: &str,
    ) -> ConvertResult<()> {
        self.flush_paragraph();

        let mut paragraph = Self::base_paragraph();
        if let Some(style) = style {
            paragraph = paragraph.style(&style);
        }
        if let Some(alignment) = parse_alignment(style_attr) {
            paragraph = paragraph.align(alignment);
        }
        self.current_paragraph = Some(paragraph);
        self.paragraph_has_content = false;

        self.process_children(node, fmt)?;
        self.flush_paragraph();
        Ok(())
    }

    fn styled_run(&self, fmt: RunFormat) -> Run {
        let mut run = Run::new();
        if fmt.bold {
            run = run.bold();
        }
        if fmt.italic {
            run = run.italic();
        }
        if fmt.underline {
            run = run.underline("single");
        }
        run
    }

    fn add_text(&mut self, text: &str, fmt: RunFormat) {
        let run = self.styled_run(fmt).add_text(text.to_string());
        self.append_run(run);
    }

    fn append_run(&mut self, run: Run) {
        let paragraph = self
            .current_paragraph
            .take()
            .unwrap_or_else(Self::base_paragraph);
        self.current_paragraph = Some(paragraph.add_run(run));
        self.paragraph_has_content = true;
    }

    fn flush_paragraph(&mut self) {
        if let Some(paragraph) = self.current_paragraph.take() {
            if self.paragraph_has_content {
                let paragraph = if self.pending_page_break {
                    self.pending_page_break = false;
                    paragraph.page_break_before(true)
                } else {
                    paragraph
                };
                self.docx = self.docx.clone().add_paragraph(paragraph);
            }
        }
        self.paragraph_has_content = false;
    }

    fn process_table(&mut self, node: &NodeRef) -> ConvertResult<()> {
        self.flush_paragraph();

        let mut rows = Vec::new();
        if let Ok(row_nodes) = node.select("tr") {
            for row in row_nodes {
                let mut cells = Vec::new();
                if let Ok(cell_nodes) = row.as_node().select("td, th") {
                    for cell in cell_nodes {
                        let text = cell.as_node().text_contents();
                        let paragraph = Self::base_paragraph()
                            .add_run(Run::new().add_text(text.trim().to_string()));
                        cells.push(TableCell::new().add_paragraph(paragraph));
                    }
                }
                if !cells.is_empty() {
                    rows.push(TableRow::new(cells).cant_split());
                }
            }
        }

        if !rows.is_empty() {
            let table = rows
                .into_iter()
                .fold(Table::new(vec![]), |table, row| table.add_row(row));
            self.docx = self.docx.clone().add_table(table);
        }
        Ok(())
    }

    /// Embed a base64 image. Undecodable payloads are skipped, matching the
    /// normalizer's non-fatal policy for malformed data URIs.
    fn process_image(&mut self, element: &ElementData) {
        let src = element
            .attributes
            .borrow()
            .get("src")
            .map(str::to_string)
            .unwrap_or_default();

        let Some(payload) = src.split(";base64,").nth(1) else {
            return;
        };
        let Ok(data) = base64::engine::general_purpose::STANDARD.decode(payload.trim()) else {
            tracing::warn!("skipping image with undecodable base64 payload");
            return;
        };

        let pic = Pic::new(&data).size(FALLBACK_IMAGE_WIDTH_EMU, FALLBACK_IMAGE_HEIGHT_EMU);
        let run = Run::new().add_image(pic);
        self.append_run(run);
    }

    fn finish(mut self) -> ConvertResult<Vec<u8>> {
        self.flush_paragraph();

        let mut buffer = Vec::new();
        self.docx
            .build()
            .pack(&mut std::io::Cursor::new(&mut buffer))
            .map_err(|e| ConvertError::ConversionFailed(format!("Failed to pack DOCX: {}", e)))?;

        Ok(buffer)
    }
}

fn parse_alignment(style_attr: &str) -> Option<AlignmentType> {
    if style_attr.contains("text-align: center") {
        Some(AlignmentType::Center)
    } else if style_attr.contains("text-align: right") {
        Some(AlignmentType::Right)
    } else if style_attr.contains("text-align: justify") {
        Some(AlignmentType::Both)
    } else if style_attr.contains("text-align: left") {
        Some(AlignmentType::Left)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(buffer: &[u8], name: &str) -> String {
        let mut archive =
            zip::ZipArchive::new(std::io::Cursor::new(buffer.to_vec())).expect("zip archive");
        let mut part = archive.by_name(name).expect("part present");
        let mut content = String::new();
        part.read_to_string(&mut content).expect("read part");
        content
    }

    #[test]
    fn test_render_sets_legal_page_size() {
        let buffer = DocxRenderer::new("Nirmala UI")
            .render("<p>Hello</p>")
            .expect("render");
        let document = read_part(&buffer, "word/document.xml");
        assert!(document.contains(r#"w:w="12240""#));
        assert!(document.contains(r#"w:h="20160""#));
    }

    #[test]
    fn test_render_emits_text_and_formatting() {
        let buffer = DocxRenderer::new("Nirmala UI")
            .render("<p>plain <strong>bold</strong> <em>italic</em></p>")
            .expect("render");
        let document = read_part(&buffer, "word/document.xml");
        assert!(document.contains("plain"));
        assert!(document.contains("bold"));
        assert!(document.contains("<w:b />") || document.contains("<w:b/>"));
        assert!(document.contains("<w:i />") || document.contains("<w:i/>"));
    }

    #[test]
    fn test_render_emits_table() {
        let buffer = DocxRenderer::new("Nirmala UI")
            .render("<table><tr><td>cell one</td><td>cell two</td></tr></table>")
            .expect("render");
        let document = read_part(&buffer, "word/document.xml");
        assert!(document.contains("<w:tbl>"));
        assert!(document.contains("cell one"));
        assert!(document.contains("cell two"));
    }

    #[test]
    fn test_page_break_div_breaks_next_paragraph() {
        let buffer = DocxRenderer::new("Nirmala UI")
            .render(
                r#"<p>first</p><div style="page-break-after: always;"></div><p>second</p>"#,
            )
            .expect("render");
        let document = read_part(&buffer, "word/document.xml");
        assert!(document.contains("pageBreakBefore"));
    }

    #[test]
    fn test_alignment_style_applied() {
        let buffer = DocxRenderer::new("Nirmala UI")
            .render(r#"<p style="text-align: center;">centered</p>"#)
            .expect("render");
        let document = read_part(&buffer, "word/document.xml");
        assert!(document.contains(r#"w:val="center""#));
    }

    #[test]
    fn test_default_fonts_declared() {
        let buffer = DocxRenderer::new("Nirmala UI")
            .render("<p>text</p>")
            .expect("render");
        let styles = read_part(&buffer, "word/styles.xml");
        assert!(styles.contains("Nirmala UI"));
    }
}
