// src/db/insight_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    models::insights::{Insight, NewInsight},
};

#[async_trait]
pub trait InsightStore: Send + Sync {
    async fn create(&self, insight: NewInsight) -> Result<Insight, AppError>;

    /// Mais novos primeiro; `limit = None` traz todos.
    async fn list(&self, tenant_id: Uuid, limit: Option<i64>) -> Result<Vec<Insight>, AppError>;

    async fn count_unread(&self, tenant_id: Uuid) -> Result<i64, AppError>;

    async fn mark_read(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Insight>, AppError>;
}

#[derive(Clone)]
pub struct PgInsightRepository {
    pool: PgPool,
}

impl PgInsightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InsightStore for PgInsightRepository {
    async fn create(&self, insight: NewInsight) -> Result<Insight, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, insight.tenant_id).await?;

        let created = sqlx::query_as::<_, Insight>(
            r#"
            INSERT INTO insights (id, tenant_id, title, description, type, data, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(insight.id)
        .bind(insight.tenant_id)
        .bind(&insight.title)
        .bind(&insight.description)
        .bind(&insight.insight_type)
        .bind(&insight.data)
        .bind(insight.priority)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn list(&self, tenant_id: Uuid, limit: Option<i64>) -> Result<Vec<Insight>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        // LIMIT NULL = sem limite
        let insights = sqlx::query_as::<_, Insight>(
            r#"
            SELECT * FROM insights
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(insights)
    }

    async fn count_unread(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM insights WHERE tenant_id = $1 AND is_read = false",
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(count)
    }

    async fn mark_read(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Insight>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let insight = sqlx::query_as::<_, Insight>(
            r#"
            UPDATE insights SET is_read = true
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(insight)
    }
}
