use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// A document record: one original PDF inside a project, plus (by convention)
/// an HTML translation stored next to it in the blob store.
///
/// The HTML counterpart's path is always derived from `name` by swapping the
/// `.pdf` suffix for `.html`; it is never stored on the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Document {
    pub id: Uuid,
    pub project_id: Uuid,
    pub folder_id: Option<Uuid>,
    /// Original PDF filename, e.g. `judgment-42.pdf`.
    pub name: String,
    /// Workflow status, owned by the workflow subsystem; carried opaquely here.
    pub status: String,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Name without the `.pdf` suffix; used for archive folders and derived
    /// artifact names.
    pub fn base_name(&self) -> &str {
        self.name.strip_suffix(".pdf").unwrap_or(&self.name)
    }

    /// Filename of the HTML translation counterpart.
    pub fn html_name(&self) -> String {
        format!("{}.html", self.base_name())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Uuid>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        DocumentResponse {
            id: doc.id,
            name: doc.name,
            status: doc.status,
            uploaded_at: doc.uploaded_at,
            updated_at: doc.updated_at,
            folder_id: doc.folder_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_document(name: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            folder_id: None,
            name: name.to_string(),
            status: "ready".to_string(),
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_base_name_strips_pdf_suffix() {
        let doc = test_document("judgment-42.pdf");
        assert_eq!(doc.base_name(), "judgment-42");
        assert_eq!(doc.html_name(), "judgment-42.html");
    }

    #[test]
    fn test_base_name_without_pdf_suffix() {
        let doc = test_document("scanned-order");
        assert_eq!(doc.base_name(), "scanned-order");
        assert_eq!(doc.html_name(), "scanned-order.html");
    }

    #[test]
    fn test_document_response_from_document() {
        let doc = test_document("petition.pdf");
        let id = doc.id;
        let response = DocumentResponse::from(doc);
        assert_eq!(response.id, id);
        assert_eq!(response.name, "petition.pdf");
        assert_eq!(response.status, "ready");
        assert_eq!(response.folder_id, None);
    }
}
