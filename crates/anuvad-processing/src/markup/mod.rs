//! Markup normalizer.
//!
//! Rewrites editor-produced HTML into a canonical form that renders the same
//! in a headless browser and survives OOXML conversion. Each rule is an
//! isolated function; the order is fixed because later rules target the
//! output of earlier ones:
//!
//! 1. string pre-passes on the raw input (indent markers, page breaks);
//! 2. one DOM pass (table borders, head style block, em/strong wrapping);
//! 3. string passes on the serialized body (base64 images, alignment
//!    classes, font tokens);
//! 4. final document wrapper (line-height container, `@font-face`, baseline
//!    styles).
//!
//! The base64-image and alignment-class rules are idempotent: canonical input
//! passes through unchanged.

use base64::Engine;
use kuchiki::traits::TendrilSink;
use kuchiki::NodeRef;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{ConvertError, ConvertResult};

/// Editor class marking a line indent; the DOCX converter ignores CSS
/// classes, so the marker becomes literal non-breaking-space padding.
const INDENT_MARKER: &str = r#"<span class="line-indent"></span>"#;
const INDENT_PADDING_ENTITIES: usize = 12;

/// Editor element marking a manual page break.
const PAGE_BREAK_MARKER: &str = r#"<div class="page-break"></div>"#;
const PAGE_BREAK_DIVIDER: &str = r#"<div style="page-break-after: always;"></div>"#;

/// Border styling forced onto tables; the converter drops inherited styles.
const TABLE_STYLE: &str = "border-collapse: collapse; border: 1px solid black; width: 100%;";
const CELL_STYLE: &str = "border: 1px solid black;";

/// Editor font token and its canonical display name.
const FONT_TOKEN: &str = "nirmala-ui";

fn data_uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"data:image/[a-zA-Z0-9.+-]+;base64,([A-Za-z0-9+/=\s]*)"#)
            .expect("valid data URI regex")
    })
}

fn alignment_class_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"class="align-(center|left|right|justify)""#).expect("valid alignment regex")
    })
}

/// Normalizes editor HTML for rendering and conversion.
pub struct MarkupNormalizer {
    font_name: String,
}

impl MarkupNormalizer {
    pub fn new(font_name: impl Into<String>) -> Self {
        Self {
            font_name: font_name.into(),
        }
    }

    /// Run the full rule chain. Fails with `ContentUnavailable` before any
    /// transformation if the fetched HTML is empty.
    pub fn normalize(&self, html: &str) -> ConvertResult<String> {
        if html.trim().is_empty() {
            return Err(ConvertError::ContentUnavailable(
                "fetched HTML is empty".to_string(),
            ));
        }

        let html = expand_indent_markers(html);
        let html = expand_page_break_markers(&html);

        let (body, head_styles) = apply_dom_transforms(&html)?;

        let body = normalize_base64_images(&body);
        let body = convert_alignment_classes(&body);
        let body = normalize_font_tokens(&body);

        Ok(self.wrap_document(&body, &head_styles))
    }

    /// Embed the processed body in a complete HTML document with the target
    /// font and baseline block styles. A container div enforces the 1.5
    /// line-height even where the body style is dropped.
    fn wrap_document(&self, body: &str, head_styles: &str) -> String {
        let font_file = format!("{}.ttf", self.font_name.replace(' ', ""));
        format!(
            r#"<html>
  <head>
    <style>
      @font-face {{
          font-family: '{font}';
          src: url('/assets/fonts/{font_file}') format('truetype');
          font-weight: normal;
          font-style: normal;
      }}
      body {{
        font-family: '{font}', sans-serif;
        line-height: 1.5;
      }}
      p {{
        line-height: 1.5;
        margin: 0;
      }}
      h1, h2, h3, h4, h5, h6 {{
        font-weight: bold;
        margin: 0 0 10px 0;
      }}
    </style>
    {head_styles}
  </head>
  <body><div style="line-height: 1.5;">{body}</div></body>
</html>"#,
            font = self.font_name,
            font_file = font_file,
            head_styles = head_styles,
            body = body,
        )
    }
}

/// Rule 1: indent marker spans become literal `&nbsp;` padding.
pub(crate) fn expand_indent_markers(html: &str) -> String {
    html.replace(INDENT_MARKER, &"&nbsp;".repeat(INDENT_PADDING_ENTITIES))
}

/// Rule 2: editor page-break markers become explicit CSS page breaks.
pub(crate) fn expand_page_break_markers(html: &str) -> String {
    html.replace(PAGE_BREAK_MARKER, PAGE_BREAK_DIVIDER)
}

/// Rules 3-5: parse once, force table borders, inject the table style block
/// into the head, wrap em/strong in style-preserving spans, then serialize.
///
/// Returns the serialized body content and any head style blocks (the parser
/// creates a head when the input has none).
pub(crate) fn apply_dom_transforms(html: &str) -> ConvertResult<(String, String)> {
    let document = kuchiki::parse_html().one(html);

    force_table_borders(&document)?;
    inject_table_style_block(&document)?;
    wrap_emphasis_tags(&document)?;

    let body = document
        .select_first("body")
        .map_err(|()| ConvertError::ConversionFailed("parsed document has no body".to_string()))?;
    let mut body_html = String::new();
    for child in body.as_node().children() {
        body_html.push_str(&serialize_node(&child)?);
    }

    let mut head_styles = String::new();
    if let Ok(styles) = document.select("head style") {
        for style in styles {
            head_styles.push_str(&serialize_node(style.as_node())?);
        }
    }

    Ok((body_html, head_styles))
}

fn serialize_node(node: &NodeRef) -> ConvertResult<String> {
    let mut out = Vec::new();
    node.serialize(&mut out)
        .map_err(|e| ConvertError::ConversionFailed(format!("HTML serialization failed: {}", e)))?;
    String::from_utf8(out)
        .map_err(|e| ConvertError::ConversionFailed(format!("HTML is not valid UTF-8: {}", e)))
}

/// Rule 3: explicit border styling on every table, row, and cell.
fn force_table_borders(document: &NodeRef) -> ConvertResult<()> {
    append_style(document, "table", TABLE_STYLE)?;
    append_style(document, "tr, td, th", CELL_STYLE)?;
    Ok(())
}

fn append_style(document: &NodeRef, selector: &str, style: &str) -> ConvertResult<()> {
    let matches: Vec<_> = document
        .select(selector)
        .map_err(|()| ConvertError::ConversionFailed(format!("invalid selector: {}", selector)))?
        .collect();

    for element in matches {
        let mut attrs = element.attributes.borrow_mut();
        let merged = match attrs.get("style") {
            Some(existing) if existing.contains(style) => existing.to_string(),
            Some(existing) => format!("{} {}", existing.trim_end_matches(' '), style),
            None => style.to_string(),
        };
        attrs.insert("style", merged);
    }
    Ok(())
}

/// Rule 4: global table border rules in the document head. The parser
/// guarantees a head element exists even for fragment input.
fn inject_table_style_block(document: &NodeRef) -> ConvertResult<()> {
    let head = document
        .select_first("head")
        .map_err(|()| ConvertError::ConversionFailed("parsed document has no head".to_string()))?;

    let style_html = format!(
        "<style>table, tr, td, th {{ {} }} table {{ width: 100%; }}</style>",
        "border-collapse: collapse; border: 1px solid black;"
    );
    let fragment = kuchiki::parse_html().one(style_html);
    if let Ok(style) = fragment.select_first("style") {
        let node = style.as_node().clone();
        node.detach();
        head.as_node().append(node);
    }
    Ok(())
}

/// Rule 5: wrap each em/strong in a neutral span carrying the element's
/// inline style, so converters that flatten nested inline formatting keep it.
fn wrap_emphasis_tags(document: &NodeRef) -> ConvertResult<()> {
    let matches: Vec<_> = document
        .select("em, strong")
        .map_err(|()| ConvertError::ConversionFailed("invalid selector: em, strong".to_string()))?
        .collect();

    for element in matches {
        let node = element.as_node();
        // Skip markers already wrapped by an earlier pass
        if let Some(parent) = node.parent() {
            if let Some(parent_el) = parent.as_element() {
                if &*parent_el.name.local == "span"
                    && parent_el
                        .attributes
                        .borrow()
                        .get("data-style-wrap")
                        .is_some()
                {
                    continue;
                }
            }
        }

        let style = {
            let mut attrs = element.attributes.borrow_mut();
            let style = attrs.get("style").map(str::to_string);
            attrs.remove("style");
            style
        };

        let wrapper_html = match &style {
            Some(style) => format!(r#"<span data-style-wrap="" style="{}"></span>"#, style),
            None => r#"<span data-style-wrap=""></span>"#.to_string(),
        };
        let fragment = kuchiki::parse_html().one(wrapper_html);
        let wrapper = fragment
            .select_first("span")
            .map_err(|()| {
                ConvertError::ConversionFailed("failed to build wrapper span".to_string())
            })?
            .as_node()
            .clone();
        wrapper.detach();

        node.insert_before(wrapper.clone());
        node.detach();
        wrapper.append(node.clone());
    }
    Ok(())
}

/// Rule 6: re-emit every base64 data URI as a normalized `image/png` URI.
/// Malformed payloads leave the original tag unchanged (non-fatal).
pub(crate) fn normalize_base64_images(html: &str) -> String {
    data_uri_regex()
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let payload = caps[1].trim();
            match base64::engine::general_purpose::STANDARD.decode(payload) {
                Ok(_) => format!("data:image/png;base64,{}", payload),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Rule 7: editor alignment classes become equivalent inline styles.
pub(crate) fn convert_alignment_classes(html: &str) -> String {
    alignment_class_regex()
        .replace_all(html, |caps: &regex::Captures<'_>| {
            format!(r#"style="text-align: {};""#, &caps[1])
        })
        .into_owned()
}

/// Rule 8: canonicalize the editor's font token.
pub(crate) fn normalize_font_tokens(html: &str) -> String {
    html.replace(FONT_TOKEN, "Nirmala UI")
}
