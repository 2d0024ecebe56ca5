// src/db/agent_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::agents::{Agent, AgentPatch, NewAgent},
};

#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Todos os agentes, por nome.
    async fn list_all(&self) -> Result<Vec<Agent>, AppError>;

    /// Só os ativos, mais novos primeiro.
    async fn list_active(&self) -> Result<Vec<Agent>, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Agent>, AppError>;

    async fn create(&self, agent: NewAgent) -> Result<Agent, AppError>;

    /// Aplica só os campos presentes. `None` se o agente não existe.
    async fn update(&self, id: Uuid, patch: &AgentPatch) -> Result<Option<Agent>, AppError>;

    async fn deactivate(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgAgentRepository {
    pool: PgPool,
}

impl PgAgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentStore for PgAgentRepository {
    async fn list_all(&self) -> Result<Vec<Agent>, AppError> {
        let agents = sqlx::query_as::<_, Agent>("SELECT * FROM agents ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(agents)
    }

    async fn list_active(&self) -> Result<Vec<Agent>, AppError> {
        let agents = sqlx::query_as::<_, Agent>(
            "SELECT * FROM agents WHERE is_active = true ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(agents)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(agent)
    }

    async fn create(&self, agent: NewAgent) -> Result<Agent, AppError> {
        let created = sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (id, name, description, type, strategy_focus, capabilities)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(agent.id)
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(&agent.agent_type)
        .bind(&agent.strategy_focus)
        .bind(&agent.capabilities)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &AgentPatch) -> Result<Option<Agent>, AppError> {
        if patch.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        // Só entram no SET os campos enviados; valores sempre como parâmetros
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE agents SET updated_at = NOW()");

        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(agent_type) = &patch.agent_type {
            qb.push(", type = ").push_bind(agent_type);
        }
        if let Some(focus) = &patch.strategy_focus {
            qb.push(", strategy_focus = ").push_bind(focus);
        }
        if let Some(capabilities) = &patch.capabilities {
            qb.push(", capabilities = ").push_bind(capabilities);
        }
        if let Some(status) = &patch.status {
            qb.push(", status = ").push_bind(status);
        }

        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let agent = qb
            .build_query_as::<Agent>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(agent)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE agents
            SET is_active = false, status = 'inactive', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
