//! Shared constants for page geometry, signed URLs, and fonts.
//!
//! OOXML page and spacing measurements are in twips (twentieths of a point,
//! 1 inch = 1440 twips). These values are the platform contract for every
//! converted document: US Legal pages with 1-inch margins and 1.5 line height.

/// Legal page width in twips (8.5 in).
pub const LEGAL_PAGE_WIDTH_TWIPS: u32 = 12240;

/// Legal page height in twips (14 in).
pub const LEGAL_PAGE_HEIGHT_TWIPS: u32 = 20160;

/// Letter page height in twips (11 in). Converters that ignore the requested
/// page size fall back to this; the post-processor rewrites it.
pub const LETTER_PAGE_HEIGHT_TWIPS: u32 = 15840;

/// Page margin in twips (1 in on all sides) for DOCX output.
pub const PAGE_MARGIN_TWIPS: u32 = 1440;

/// Paragraph spacing-after in twips.
pub const PARAGRAPH_SPACING_AFTER_TWIPS: u32 = 120;

/// Line spacing in twips: 360 with rule "auto" yields 1.5 line height.
pub const LINE_SPACING_TWIPS: u32 = 360;

/// Print margin for browser-rendered PDFs, in millimeters (all sides).
pub const PDF_MARGIN_MM: f64 = 25.0;

/// Legal paper dimensions in inches for browser-rendered PDFs.
pub const LEGAL_PAPER_WIDTH_IN: f64 = 8.5;
pub const LEGAL_PAPER_HEIGHT_IN: f64 = 14.0;

/// Validity window for generated signed URLs, in minutes. Expiry is the only
/// revocation mechanism; URLs are generated at point of use and never stored.
pub const SIGNED_URL_TTL_MINUTES: u64 = 15;

/// Display name of the default document font.
pub const DEFAULT_FONT_NAME: &str = "Nirmala UI";

/// Suffix appended to a document's base name for converted artifacts.
pub const TRANSLATION_SUFFIX: &str = "Translation";

/// Content types used when signing blob URLs.
pub const CONTENT_TYPE_PDF: &str = "application/pdf";
pub const CONTENT_TYPE_HTML: &str = "text/html";
pub const CONTENT_TYPE_ZIP: &str = "application/zip";
