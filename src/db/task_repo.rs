// src/db/task_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    models::tasks::{NewTask, Task, TaskPatch, TaskStatus},
};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Prioridade (alta primeiro), prazo (sem prazo por último), criação (recentes primeiro).
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<Task>, AppError>;

    async fn create(&self, task: NewTask) -> Result<Task, AppError>;

    /// `None` se a tarefa não existe no tenant.
    async fn update(&self, tenant_id: Uuid, id: Uuid, patch: &TaskPatch) -> Result<Option<Task>, AppError>;

    /// Pendentes com prazo mais próximo (sem prazo por último).
    async fn upcoming_pending(&self, tenant_id: Uuid, limit: i64) -> Result<Vec<Task>, AppError>;

    async fn count_pending(&self, tenant_id: Uuid) -> Result<i64, AppError>;
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskRepository {
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<Task>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE tenant_id = $1
            ORDER BY
                CASE priority WHEN 'high' THEN 1 WHEN 'medium' THEN 2 ELSE 3 END,
                due_date ASC NULLS LAST,
                created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tasks)
    }

    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, task.tenant_id).await?;

        let created = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, tenant_id, title, description, priority, due_date, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(task.tenant_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(&task.assigned_to)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, patch: &TaskPatch) -> Result<Option<Task>, AppError> {
        if patch.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tasks SET ");
        let mut set = qb.separated(", ");

        if let Some(title) = &patch.title {
            set.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = &patch.description {
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(priority) = patch.priority {
            set.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status);
            // Concluir carimba a data; reabrir mantém a última conclusão
            if status == TaskStatus::Completed {
                set.push("completed_at = NOW()");
            }
        }
        if let Some(due_date) = patch.due_date {
            set.push("due_date = ").push_bind_unseparated(due_date);
        }
        if let Some(assigned_to) = &patch.assigned_to {
            set.push("assigned_to = ").push_bind_unseparated(assigned_to);
        }

        qb.push(" WHERE tenant_id = ")
            .push_bind(tenant_id)
            .push(" AND id = ")
            .push_bind(id)
            .push(" RETURNING *");

        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;
        let task = qb.build_query_as::<Task>().fetch_optional(&mut *tx).await?;
        tx.commit().await?;

        Ok(task)
    }

    async fn upcoming_pending(&self, tenant_id: Uuid, limit: i64) -> Result<Vec<Task>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE tenant_id = $1 AND status = 'pending'
            ORDER BY due_date ASC NULLS LAST, created_at ASC
            LIMIT $2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tasks)
    }

    async fn count_pending(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE tenant_id = $1 AND status = 'pending'",
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(count)
    }
}
