// src/db/receipt_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;

/// Recibos de consumo: a primeira entrega de um evento "reivindica" o id,
/// as reentregas encontram o recibo e viram no-op.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// `true` se o evento ainda não tinha sido reivindicado por este consumidor.
    async fn claim(&self, consumer: &str, event_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgReceiptRepository {
    pool: PgPool,
}

impl PgReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReceiptStore for PgReceiptRepository {
    async fn claim(&self, consumer: &str, event_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO event_receipts (consumer, event_id)
            VALUES ($1, $2)
            ON CONFLICT (consumer, event_id) DO NOTHING
            "#,
        )
        .bind(consumer)
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
