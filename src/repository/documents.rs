//! Documents repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::document::Document,
};

#[derive(Clone)]
pub struct DocumentsRepository {
    pool: Pool<Postgres>,
}

impl DocumentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a document by ID regardless of its review state
    pub async fn get_by_id(&self, id: i32) -> AppResult<Document> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document with id {} not found", id)))
    }

    /// Get a previewable document by ID. Only published documents with a
    /// publication date are visible to the preview path.
    pub async fn get_published(&self, id: i32) -> AppResult<Document> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE id = $1
              AND submission_status = 'Published'
              AND published_at IS NOT NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document with id {} not found", id)))
    }
}
