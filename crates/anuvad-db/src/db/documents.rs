use anuvad_core::{models::Document, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for document records
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a document by ID (project-scoped)
    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select", db.record_id = %id))]
    pub async fn get_document(
        &self,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Document>, AppError> {
        let document = sqlx::query_as::<Postgres, Document>(
            "SELECT id, project_id, folder_id, name, status, uploaded_at, updated_at FROM documents WHERE project_id = $1 AND id = $2"
        )
        .bind(project_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// List documents for a project, optionally filtered by folder
    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    pub async fn list_documents(
        &self,
        project_id: Uuid,
        folder_id: Option<Option<Uuid>>, // Option<Option> to distinguish unfiltered from root-only
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, AppError> {
        let documents = match folder_id {
            None => {
                sqlx::query_as::<Postgres, Document>(
                    "SELECT id, project_id, folder_id, name, status, uploaded_at, updated_at FROM documents WHERE project_id = $1 ORDER BY name ASC LIMIT $2 OFFSET $3"
                )
                .bind(project_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            Some(None) => {
                sqlx::query_as::<Postgres, Document>(
                    "SELECT id, project_id, folder_id, name, status, uploaded_at, updated_at FROM documents WHERE project_id = $1 AND folder_id IS NULL ORDER BY name ASC LIMIT $2 OFFSET $3"
                )
                .bind(project_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            Some(Some(fid)) => {
                sqlx::query_as::<Postgres, Document>(
                    "SELECT id, project_id, folder_id, name, status, uploaded_at, updated_at FROM documents WHERE project_id = $1 AND folder_id = $2 ORDER BY name ASC LIMIT $3 OFFSET $4"
                )
                .bind(project_id)
                .bind(fid)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(documents)
    }

    /// Check whether a document exists (project-scoped)
    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select", db.record_id = %id))]
    pub async fn document_exists(&self, project_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE project_id = $1 AND id = $2)",
        )
        .bind(project_id)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
