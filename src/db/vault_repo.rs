// src/db/vault_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    models::vault::{Document, NewDocument},
};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<Document>, AppError>;

    async fn create(&self, document: NewDocument) -> Result<Document, AppError>;

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Document>, AppError>;
}

#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentRepository {
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<Document>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let documents = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE tenant_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(documents)
    }

    async fn create(&self, document: NewDocument) -> Result<Document, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, document.tenant_id).await?;

        let created = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (id, tenant_id, name, type, size_bytes, file_path, tags, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(document.id)
        .bind(document.tenant_id)
        .bind(&document.name)
        .bind(&document.content_type)
        .bind(document.size_bytes)
        .bind(&document.file_path)
        .bind(&document.tags)
        .bind(&document.uploaded_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Document>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let document = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(document)
    }
}
