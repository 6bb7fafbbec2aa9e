//! Shared blob path generation.
//!
//! Path format: `projects/{project_id}/{file_name}`. Ownership of a path is
//! purely by convention; callers reconstruct it from the document record on
//! every request and never persist it.

use uuid::Uuid;

/// Blob path for a file stored under a project.
pub fn document_key(project_id: Uuid, file_name: &str) -> String {
    format!("projects/{}/{}", project_id, file_name)
}

/// Blob path of the HTML translation counterpart of a PDF.
///
/// Derived by replacing the `.pdf` suffix with `.html`; a name without the
/// suffix gets `.html` appended.
pub fn html_key(project_id: Uuid, pdf_name: &str) -> String {
    let base = pdf_name.strip_suffix(".pdf").unwrap_or(pdf_name);
    format!("projects/{}/{}.html", project_id, base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_key_format() {
        let project_id = Uuid::nil();
        assert_eq!(
            document_key(project_id, "judgment-42.pdf"),
            "projects/00000000-0000-0000-0000-000000000000/judgment-42.pdf"
        );
    }

    #[test]
    fn test_html_key_replaces_pdf_suffix() {
        let project_id = Uuid::nil();
        assert_eq!(
            html_key(project_id, "judgment-42.pdf"),
            "projects/00000000-0000-0000-0000-000000000000/judgment-42.html"
        );
    }

    #[test]
    fn test_html_key_without_pdf_suffix() {
        let project_id = Uuid::nil();
        assert_eq!(
            html_key(project_id, "scanned-order"),
            "projects/00000000-0000-0000-0000-000000000000/scanned-order.html"
        );
    }
}
