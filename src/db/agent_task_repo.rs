// src/db/agent_task_repo.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    models::agents::{AgentTask, NewAgentTask},
};

/// Transições de estado são condicionais: cada método devolve `true` só se
/// a linha estava no estado de origem esperado.
#[async_trait]
pub trait AgentTaskStore: Send + Sync {
    async fn create(&self, task: NewAgentTask) -> Result<AgentTask, AppError>;

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<AgentTask>, AppError>;

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<AgentTask>, AppError>;

    /// pending -> processing
    async fn mark_processing(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// processing -> completed
    async fn mark_completed(&self, tenant_id: Uuid, id: Uuid, output: &Value) -> Result<bool, AppError>;

    /// pending | processing -> failed
    async fn mark_failed(&self, tenant_id: Uuid, id: Uuid, error: &str) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgAgentTaskRepository {
    pool: PgPool,
}

impl PgAgentTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentTaskStore for PgAgentTaskRepository {
    async fn create(&self, task: NewAgentTask) -> Result<AgentTask, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, task.tenant_id).await?;

        let created = sqlx::query_as::<_, AgentTask>(
            r#"
            INSERT INTO agent_tasks (id, tenant_id, agent_id, task_type, input_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(task.tenant_id)
        .bind(task.agent_id)
        .bind(&task.task_type)
        .bind(&task.input_data)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<AgentTask>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let tasks = sqlx::query_as::<_, AgentTask>(
            "SELECT * FROM agent_tasks WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tasks)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<AgentTask>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let task = sqlx::query_as::<_, AgentTask>(
            "SELECT * FROM agent_tasks WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn mark_processing(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE agent_tasks
            SET status = 'processing', started_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(&self, tenant_id: Uuid, id: Uuid, output: &Value) -> Result<bool, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE agent_tasks
            SET status = 'completed', completed_at = NOW(), output_data = $3
            WHERE tenant_id = $1 AND id = $2 AND status = 'processing'
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(output)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(&self, tenant_id: Uuid, id: Uuid, error: &str) -> Result<bool, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE agent_tasks
            SET status = 'failed', completed_at = NOW(), error = $3
            WHERE tenant_id = $1 AND id = $2 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(error)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }
}
