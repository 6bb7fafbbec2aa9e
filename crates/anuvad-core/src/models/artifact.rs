use std::fmt;
use std::str::FromStr;

use crate::constants::TRANSLATION_SUFFIX;
use crate::error::AppError;

/// Target format for a document conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Docx,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" => Ok(OutputFormat::Docx),
            other => Err(AppError::UnsupportedFormat(format!(
                "Invalid file type requested: {}",
                other
            ))),
        }
    }
}

/// A freshly converted document: in-memory bytes plus naming and the blob path
/// of the original PDF. Produced per request and never cached; every download
/// re-renders from the canonical HTML.
#[derive(Debug, Clone)]
pub struct ConvertedArtifact {
    pub data: Vec<u8>,
    /// Derived name, `<base>Translation.<ext>` by policy.
    pub file_name: String,
    /// Blob path of the original PDF (`projects/{project}/{name}`).
    pub original_key: String,
    /// Stored name of the original PDF.
    pub original_name: String,
}

impl ConvertedArtifact {
    /// Canonical artifact name for a document base name and target format.
    pub fn derive_name(base_name: &str, format: OutputFormat) -> String {
        format!("{}{}.{}", base_name, TRANSLATION_SUFFIX, format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("pdf".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("DOCX".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert!(matches!(
            "txt".parse::<OutputFormat>(),
            Err(AppError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(OutputFormat::Pdf.content_type(), "application/pdf");
        assert!(OutputFormat::Docx.content_type().contains("wordprocessingml"));
    }

    #[test]
    fn test_derive_name() {
        assert_eq!(
            ConvertedArtifact::derive_name("judgment-42", OutputFormat::Docx),
            "judgment-42Translation.docx"
        );
        assert_eq!(
            ConvertedArtifact::derive_name("judgment-42", OutputFormat::Pdf),
            "judgment-42Translation.pdf"
        );
    }
}
