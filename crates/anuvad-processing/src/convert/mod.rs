//! Conversion orchestrator.
//!
//! One sequential pipeline per request:
//! fetch metadata -> locate HTML blob -> fetch HTML -> normalize -> render ->
//! post-process (DOCX only) -> return artifact. No stage retries; the first
//! failure short-circuits everything after it and propagates to the HTTP
//! layer unchanged.

mod fetcher;

pub use fetcher::ReqwestHtmlFetcher;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use anuvad_core::{AppError, ConvertedArtifact, Document, OutputFormat};
use anuvad_db::DocumentRepository;
use anuvad_storage::{keys, Storage, StorageError};

use crate::error::{ConvertError, ConvertResult};
use crate::markup::MarkupNormalizer;
use crate::package::enforce_page_geometry;
use crate::render::Renderer;

/// Metadata-store seam: point lookup of one document record.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn get_document(
        &self,
        project_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Document>, AppError>;
}

#[async_trait]
impl DocumentSource for DocumentRepository {
    async fn get_document(
        &self,
        project_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Document>, AppError> {
        DocumentRepository::get_document(self, project_id, document_id).await
    }
}

/// Signed-URL fetch seam for the stored HTML translation.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ConvertResult<String>;
}

/// Ties the pipeline stages together per document.
pub struct ConversionPipeline {
    documents: Arc<dyn DocumentSource>,
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn HtmlFetcher>,
    renderer: Arc<dyn Renderer>,
    normalizer: MarkupNormalizer,
    signed_url_ttl: Duration,
}

impl ConversionPipeline {
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn HtmlFetcher>,
        renderer: Arc<dyn Renderer>,
        normalizer: MarkupNormalizer,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            documents,
            storage,
            fetcher,
            renderer,
            normalizer,
            signed_url_ttl,
        }
    }

    /// Convert one document's HTML translation into the requested format.
    ///
    /// The blob paths are reconstructed from the record's `name` on every
    /// call; nothing about the conversion is persisted or cached.
    #[tracing::instrument(
        skip(self),
        fields(
            project_id = %project_id,
            document_id = %document_id,
            format = %format,
            operation = "convert_document"
        )
    )]
    pub async fn convert_document(
        &self,
        project_id: Uuid,
        document_id: Uuid,
        format: OutputFormat,
    ) -> ConvertResult<ConvertedArtifact> {
        // FetchMetadata
        let document = self
            .documents
            .get_document(project_id, document_id)
            .await
            .map_err(ConvertError::Metadata)?
            .ok_or_else(|| ConvertError::NotFound("Document not found".to_string()))?;

        // LocateHtmlBlob
        let html_key = keys::html_key(project_id, &document.name);
        let original_key = keys::document_key(project_id, &document.name);
        let html_url = self
            .storage
            .get_presigned_url(&html_key, self.signed_url_ttl)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => ConvertError::NotFound(format!(
                    "HTML translation not found for {}",
                    document.name
                )),
                other => ConvertError::from(other),
            })?;

        // FetchHtml
        let html = self.fetcher.fetch(&html_url).await?;

        // Normalize (raises ContentUnavailable before any transformation)
        let normalized = self.normalizer.normalize(&html)?;

        // Render
        let data = self.renderer.render(&normalized, format).await?;

        // PostProcess: converters do not always honor page options
        let data = match format {
            OutputFormat::Docx => enforce_page_geometry(&data)?,
            OutputFormat::Pdf => data,
        };

        tracing::info!(
            document = %document.name,
            size_bytes = data.len(),
            "document converted"
        );

        Ok(ConvertedArtifact {
            data,
            file_name: ConvertedArtifact::derive_name(document.base_name(), format),
            original_key,
            original_name: document.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::EntryCompression;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticDocumentSource {
        document: Option<Document>,
    }

    #[async_trait]
    impl DocumentSource for StaticDocumentSource {
        async fn get_document(
            &self,
            _project_id: Uuid,
            _document_id: Uuid,
        ) -> Result<Option<Document>, AppError> {
            Ok(self.document.clone())
        }
    }

    struct StaticFetcher {
        html: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HtmlFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> ConvertResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.html.clone())
        }
    }

    struct CountingRenderer {
        output: Vec<u8>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Renderer for CountingRenderer {
        async fn render(&self, _html: &str, _format: OutputFormat) -> ConvertResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    struct MapStorage {
        known: Vec<String>,
    }

    #[async_trait]
    impl Storage for MapStorage {
        async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
            Err(StorageError::NotFound(path.to_string()))
        }

        async fn upload_with_key(
            &self,
            _path: &str,
            _data: Vec<u8>,
            _content_type: &str,
        ) -> Result<(), StorageError> {
            Ok(())
        }

        async fn delete(&self, _path: &str) -> Result<(), StorageError> {
            Ok(())
        }

        async fn exists(&self, path: &str) -> Result<bool, StorageError> {
            Ok(self.known.iter().any(|k| k == path))
        }

        async fn content_length(&self, _path: &str) -> Result<u64, StorageError> {
            Ok(0)
        }

        async fn get_presigned_url(
            &self,
            path: &str,
            _expires_in: Duration,
        ) -> Result<String, StorageError> {
            if self.known.iter().any(|k| k == path) {
                Ok(format!("https://signed.example/{}", path))
            } else {
                Err(StorageError::NotFound(path.to_string()))
            }
        }

        async fn presigned_put_url(
            &self,
            path: &str,
            _content_type: &str,
            _expires_in: Duration,
        ) -> Result<String, StorageError> {
            Ok(format!("https://signed.example/put/{}", path))
        }

        fn backend_type(&self) -> anuvad_storage::StorageBackend {
            anuvad_storage::StorageBackend::Local
        }
    }

    fn test_document(project_id: Uuid) -> Document {
        Document {
            id: Uuid::new_v4(),
            project_id,
            folder_id: None,
            name: "judgment-42.pdf".to_string(),
            status: "ready".to_string(),
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn pipeline_with(
        document: Option<Document>,
        html: &str,
        known_blobs: Vec<String>,
    ) -> (ConversionPipeline, Arc<StaticFetcher>, Arc<CountingRenderer>) {
        let fetcher = Arc::new(StaticFetcher {
            html: html.to_string(),
            calls: AtomicUsize::new(0),
        });
        let renderer = Arc::new(CountingRenderer {
            output: b"rendered".to_vec(),
            calls: AtomicUsize::new(0),
        });
        let pipeline = ConversionPipeline::new(
            Arc::new(StaticDocumentSource { document }),
            Arc::new(MapStorage { known: known_blobs }),
            fetcher.clone(),
            renderer.clone(),
            MarkupNormalizer::new("Nirmala UI"),
            Duration::from_secs(900),
        );
        (pipeline, fetcher, renderer)
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let (pipeline, _, renderer) = pipeline_with(None, "<p>x</p>", vec![]);
        let err = pipeline
            .convert_document(Uuid::new_v4(), Uuid::new_v4(), OutputFormat::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::NotFound(_)));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_html_blob_is_not_found() {
        let project_id = Uuid::new_v4();
        let (pipeline, fetcher, renderer) =
            pipeline_with(Some(test_document(project_id)), "<p>x</p>", vec![]);
        let err = pipeline
            .convert_document(project_id, Uuid::new_v4(), OutputFormat::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::NotFound(_)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_html_short_circuits_before_render() {
        let project_id = Uuid::new_v4();
        let html_key = keys::html_key(project_id, "judgment-42.pdf");
        let (pipeline, fetcher, renderer) =
            pipeline_with(Some(test_document(project_id)), "  ", vec![html_key]);

        let err = pipeline
            .convert_document(project_id, Uuid::new_v4(), OutputFormat::Docx)
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::ContentUnavailable(_)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        // Neither the renderer nor the packaging stage ran
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pdf_conversion_returns_artifact() {
        let project_id = Uuid::new_v4();
        let html_key = keys::html_key(project_id, "judgment-42.pdf");
        let (pipeline, _, renderer) =
            pipeline_with(Some(test_document(project_id)), "<p>hello</p>", vec![html_key]);

        let artifact = pipeline
            .convert_document(project_id, Uuid::new_v4(), OutputFormat::Pdf)
            .await
            .expect("artifact");

        assert_eq!(artifact.file_name, "judgment-42Translation.pdf");
        assert_eq!(artifact.original_name, "judgment-42.pdf");
        assert_eq!(
            artifact.original_key,
            format!("projects/{}/judgment-42.pdf", project_id)
        );
        assert_eq!(artifact.data, b"rendered");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_docx_conversion_is_post_processed() {
        let project_id = Uuid::new_v4();
        let html_key = keys::html_key(project_id, "judgment-42.pdf");

        // A real letter-sized DOCX from the renderer; the pipeline must
        // come back with the legal height.
        let letter_docx = {
            let (mut writer, mut rx) = crate::archive::ZipStreamWriter::new();
            writer
                .add_entry(
                    "word/document.xml",
                    br#"<w:document xmlns:w="ns"><w:body><w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#,
                    EntryCompression::Text(2),
                )
                .unwrap();
            writer
                .add_entry(
                    "word/styles.xml",
                    br#"<w:styles xmlns:w="ns"><w:style w:styleId="Normal"><w:name w:val="Normal"/></w:style></w:styles>"#,
                    EntryCompression::Text(2),
                )
                .unwrap();
            writer.finish().unwrap();
            let mut bytes = Vec::new();
            while let Ok(chunk) = rx.try_recv() {
                bytes.extend_from_slice(&chunk);
            }
            bytes
        };

        let fetcher = Arc::new(StaticFetcher {
            html: "<p>hello</p>".to_string(),
            calls: AtomicUsize::new(0),
        });
        let renderer = Arc::new(CountingRenderer {
            output: letter_docx,
            calls: AtomicUsize::new(0),
        });
        let pipeline = ConversionPipeline::new(
            Arc::new(StaticDocumentSource {
                document: Some(test_document(project_id)),
            }),
            Arc::new(MapStorage {
                known: vec![html_key],
            }),
            fetcher,
            renderer,
            MarkupNormalizer::new("Nirmala UI"),
            Duration::from_secs(900),
        );

        let artifact = pipeline
            .convert_document(project_id, Uuid::new_v4(), OutputFormat::Docx)
            .await
            .expect("artifact");

        assert_eq!(artifact.file_name, "judgment-42Translation.docx");

        use std::io::Read;
        let mut archive =
            zip::ZipArchive::new(std::io::Cursor::new(artifact.data)).expect("valid docx");
        let mut document = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        assert!(document.contains(r#"w:h="20160""#));
    }
}
