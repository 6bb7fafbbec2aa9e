//! Targeted OOXML patch guaranteeing legal page size and 1.5 line spacing.
//!
//! Converters do not always honor the requested page options, so the
//! generated package is re-opened and exactly two parts are patched:
//!
//! - `word/document.xml`: any `w:pgSz` with the letter width gets the legal
//!   height; every `w:spacing` gets `w:line="360" w:lineRule="auto"`.
//! - `word/styles.xml`: the "Normal" paragraph style gets the same spacing,
//!   inserted when absent.
//!
//! This is an event-level rewrite over the two parts, tolerant of attribute
//! order, not a full OOXML object model. All other parts are carried through
//! byte-for-byte.

use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ConvertError, ConvertResult};
use anuvad_core::constants::{LEGAL_PAGE_HEIGHT_TWIPS, LEGAL_PAGE_WIDTH_TWIPS, LINE_SPACING_TWIPS};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";

/// Rewrite a DOCX buffer so it declares legal page size and 1.5 line height.
pub fn enforce_page_geometry(docx: &[u8]) -> ConvertResult<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(docx))
        .map_err(|e| ConvertError::PackagingFailed(format!("Failed to open DOCX package: {}", e)))?;

    let mut parts: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut part = archive.by_index(index).map_err(|e| {
            ConvertError::PackagingFailed(format!("Failed to read DOCX part: {}", e))
        })?;
        let mut data = Vec::with_capacity(part.size() as usize);
        part.read_to_end(&mut data).map_err(|e| {
            ConvertError::PackagingFailed(format!("Failed to read DOCX part: {}", e))
        })?;
        parts.push((part.name().to_string(), data));
    }

    for (name, data) in parts.iter_mut() {
        if name == DOCUMENT_PART {
            *data = patch_document_xml(data)?;
        } else if name == STYLES_PART {
            *data = patch_styles_xml(data)?;
        }
    }

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        for (name, data) in &parts {
            zip.start_file(name, options).map_err(|e| {
                ConvertError::PackagingFailed(format!("Failed to re-add DOCX part: {}", e))
            })?;
            zip.write_all(data).map_err(|e| {
                ConvertError::PackagingFailed(format!("Failed to write DOCX part: {}", e))
            })?;
        }
        zip.finish().map_err(|e| {
            ConvertError::PackagingFailed(format!("Failed to finalize DOCX package: {}", e))
        })?;
    }

    Ok(buffer)
}

fn xml_error(e: impl std::fmt::Display) -> ConvertError {
    ConvertError::PackagingFailed(format!("OOXML patch failed: {}", e))
}

/// Rebuild a `w:pgSz` element: keep every attribute except `w:h`, then set
/// the legal height. Only applied when the width equals the letter width.
fn patch_page_size(element: &BytesStart<'_>) -> ConvertResult<Option<BytesStart<'static>>> {
    let letter_width = LEGAL_PAGE_WIDTH_TWIPS.to_string();
    let mut width_matches = false;
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == b"w:w" && attr.value.as_ref() == letter_width.as_bytes() {
            width_matches = true;
        }
    }
    if !width_matches {
        return Ok(None);
    }

    let mut patched = BytesStart::new("w:pgSz");
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() != b"w:h" {
            patched.push_attribute(attr);
        }
    }
    patched.push_attribute(("w:h", LEGAL_PAGE_HEIGHT_TWIPS.to_string().as_str()));
    Ok(Some(patched))
}

/// Rebuild a `w:spacing` element: strip any line/lineRule attributes and set
/// `w:line="360" w:lineRule="auto"`.
fn patch_spacing(element: &BytesStart<'_>) -> ConvertResult<BytesStart<'static>> {
    let mut patched = BytesStart::new("w:spacing");
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() != b"w:line" && attr.key.as_ref() != b"w:lineRule" {
            patched.push_attribute(attr);
        }
    }
    patched.push_attribute(("w:line", LINE_SPACING_TWIPS.to_string().as_str()));
    patched.push_attribute(("w:lineRule", "auto"));
    Ok(patched)
}

fn canonical_spacing() -> BytesStart<'static> {
    let mut spacing = BytesStart::new("w:spacing");
    spacing.push_attribute(("w:line", LINE_SPACING_TWIPS.to_string().as_str()));
    spacing.push_attribute(("w:lineRule", "auto"));
    spacing
}

/// Patch the main document part: page size and every spacing element.
fn patch_document_xml(xml: &[u8]) -> ConvertResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match event {
            Event::Empty(ref e) if e.name().as_ref() == b"w:pgSz" => {
                match patch_page_size(e)? {
                    Some(patched) => writer.write_event(Event::Empty(patched)),
                    None => writer.write_event(Event::Empty(e.to_owned())),
                }
                .map_err(xml_error)?;
            }
            Event::Empty(ref e) if e.name().as_ref() == b"w:spacing" => {
                writer
                    .write_event(Event::Empty(patch_spacing(e)?))
                    .map_err(xml_error)?;
            }
            Event::Eof => break,
            other => writer.write_event(other).map_err(xml_error)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

/// Patch the style sheet part: the "Normal" paragraph style must end up with
/// a canonical spacing element, overwriting existing values or inserting a
/// fresh one (and a `w:pPr` if the style had none).
fn patch_styles_xml(xml: &[u8]) -> ConvertResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();

    let mut in_normal_style = false;
    let mut in_normal_ppr = false;
    let mut normal_has_ppr = false;
    let mut spacing_written = false;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match event {
            Event::Start(ref e) if e.name().as_ref() == b"w:style" => {
                in_normal_style = style_id_is_normal(e)?;
                normal_has_ppr = false;
                spacing_written = false;
                writer.write_event(Event::Start(e.to_owned())).map_err(xml_error)?;
            }
            Event::End(ref e) if e.name().as_ref() == b"w:style" => {
                if in_normal_style && !normal_has_ppr {
                    // Style had no paragraph properties at all
                    writer
                        .write_event(Event::Start(BytesStart::new("w:pPr")))
                        .map_err(xml_error)?;
                    writer
                        .write_event(Event::Empty(canonical_spacing()))
                        .map_err(xml_error)?;
                    writer
                        .write_event(Event::End(quick_xml::events::BytesEnd::new("w:pPr")))
                        .map_err(xml_error)?;
                }
                in_normal_style = false;
                writer.write_event(Event::End(e.to_owned())).map_err(xml_error)?;
            }
            Event::Start(ref e) if in_normal_style && e.name().as_ref() == b"w:pPr" => {
                in_normal_ppr = true;
                normal_has_ppr = true;
                writer.write_event(Event::Start(e.to_owned())).map_err(xml_error)?;
            }
            Event::Empty(ref e) if in_normal_style && e.name().as_ref() == b"w:pPr" => {
                // Self-closing pPr: expand it so the spacing fits inside
                normal_has_ppr = true;
                writer
                    .write_event(Event::Start(BytesStart::new("w:pPr")))
                    .map_err(xml_error)?;
                writer
                    .write_event(Event::Empty(canonical_spacing()))
                    .map_err(xml_error)?;
                writer
                    .write_event(Event::End(quick_xml::events::BytesEnd::new("w:pPr")))
                    .map_err(xml_error)?;
            }
            Event::End(ref e) if in_normal_ppr && e.name().as_ref() == b"w:pPr" => {
                if !spacing_written {
                    writer
                        .write_event(Event::Empty(canonical_spacing()))
                        .map_err(xml_error)?;
                }
                in_normal_ppr = false;
                writer.write_event(Event::End(e.to_owned())).map_err(xml_error)?;
            }
            Event::Empty(ref e) if in_normal_ppr && e.name().as_ref() == b"w:spacing" => {
                spacing_written = true;
                writer
                    .write_event(Event::Empty(patch_spacing(e)?))
                    .map_err(xml_error)?;
            }
            Event::Eof => break,
            other => writer.write_event(other).map_err(xml_error)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn style_id_is_normal(element: &BytesStart<'_>) -> ConvertResult<bool> {
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == b"w:styleId" && attr.value.as_ref() == b"Normal" {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:pPr><w:spacing w:after="160" w:line="240" w:lineRule="atLeast" /></w:pPr><w:r><w:t>text</w:t></w:r></w:p><w:sectPr><w:pgSz w:h="15840" w:w="12240" /></w:sectPr></w:body></w:document>"#;

    const STYLES_WITH_SPACING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal" /><w:pPr><w:spacing w:line="240" w:lineRule="exact" /></w:pPr></w:style></w:styles>"#;

    const STYLES_WITHOUT_SPACING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal" /><w:pPr><w:jc w:val="left" /></w:pPr></w:style></w:styles>"#;

    const STYLES_WITHOUT_PPR: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal" /></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1" /></w:style></w:styles>"#;

    fn build_docx(document_xml: &str, styles_xml: &str) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, content) in [
                ("[Content_Types].xml", "<Types/>"),
                ("word/document.xml", document_xml),
                ("word/styles.xml", styles_xml),
            ] {
                zip.start_file(name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    fn read_part(buffer: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(buffer.to_vec())).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_letter_height_rewritten_to_legal() {
        let input = build_docx(DOCUMENT_XML, STYLES_WITH_SPACING);
        let output = enforce_page_geometry(&input).expect("patch");
        let document = read_part(&output, "word/document.xml");

        assert!(document.contains(r#"w:h="20160""#));
        assert!(!document.contains(r#"w:h="15840""#));
        // Width untouched, and exactly one page-size element changed
        assert_eq!(document.matches(r#"w:w="12240""#).count(), 1);
        assert_eq!(document.matches(r#"w:h="20160""#).count(), 1);
    }

    #[test]
    fn test_non_letter_width_left_alone() {
        let a4_document = DOCUMENT_XML.replace(r#"w:w="12240""#, r#"w:w="11906""#);
        let input = build_docx(&a4_document, STYLES_WITH_SPACING);
        let output = enforce_page_geometry(&input).expect("patch");
        let document = read_part(&output, "word/document.xml");

        assert!(document.contains(r#"w:h="15840""#));
        assert!(!document.contains(r#"w:h="20160""#));
    }

    #[test]
    fn test_document_spacing_overwritten() {
        let input = build_docx(DOCUMENT_XML, STYLES_WITH_SPACING);
        let output = enforce_page_geometry(&input).expect("patch");
        let document = read_part(&output, "word/document.xml");

        assert!(document.contains(r#"w:line="360""#));
        assert!(document.contains(r#"w:lineRule="auto""#));
        assert!(!document.contains(r#"w:lineRule="atLeast""#));
        // Attributes other than line/lineRule survive
        assert!(document.contains(r#"w:after="160""#));
    }

    #[test]
    fn test_normal_style_spacing_overwritten() {
        let input = build_docx(DOCUMENT_XML, STYLES_WITH_SPACING);
        let output = enforce_page_geometry(&input).expect("patch");
        let styles = read_part(&output, "word/styles.xml");

        assert!(styles.contains(r#"w:line="360""#));
        assert!(styles.contains(r#"w:lineRule="auto""#));
        assert!(!styles.contains(r#"w:lineRule="exact""#));
    }

    #[test]
    fn test_normal_style_spacing_inserted_when_absent() {
        let input = build_docx(DOCUMENT_XML, STYLES_WITHOUT_SPACING);
        let output = enforce_page_geometry(&input).expect("patch");
        let styles = read_part(&output, "word/styles.xml");

        assert!(styles.contains(r#"<w:spacing w:line="360" w:lineRule="auto"/>"#));
        // Existing pPr content survives
        assert!(styles.contains(r#"w:jc"#));
    }

    #[test]
    fn test_normal_style_ppr_inserted_when_absent() {
        let input = build_docx(DOCUMENT_XML, STYLES_WITHOUT_PPR);
        let output = enforce_page_geometry(&input).expect("patch");
        let styles = read_part(&output, "word/styles.xml");

        assert!(styles.contains("<w:pPr>"));
        assert!(styles.contains(r#"<w:spacing w:line="360" w:lineRule="auto"/>"#));
        // Only the Normal style gains spacing
        assert_eq!(styles.matches("w:spacing").count(), 1);
    }

    #[test]
    fn test_attribute_order_variation_tolerated() {
        // Same document with w:w before w:h
        let swapped = DOCUMENT_XML.replace(
            r#"<w:pgSz w:h="15840" w:w="12240" />"#,
            r#"<w:pgSz w:w="12240" w:h="15840" />"#,
        );
        let input = build_docx(&swapped, STYLES_WITH_SPACING);
        let output = enforce_page_geometry(&input).expect("patch");
        let document = read_part(&output, "word/document.xml");
        assert!(document.contains(r#"w:h="20160""#));
    }

    #[test]
    fn test_other_parts_untouched() {
        let input = build_docx(DOCUMENT_XML, STYLES_WITH_SPACING);
        let output = enforce_page_geometry(&input).expect("patch");
        assert_eq!(read_part(&output, "[Content_Types].xml"), "<Types/>");
    }

    #[test]
    fn test_garbage_buffer_is_packaging_failure() {
        let err = enforce_page_geometry(b"not a zip").unwrap_err();
        assert!(matches!(err, ConvertError::PackagingFailed(_)));
    }
}
