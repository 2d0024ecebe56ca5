// src/db/tenancy_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    db::user_repo::insert_user,
    models::{
        auth::NewUser,
        tenancy::{NewGovernmentPlan, NewTenant, Tenant},
    },
};

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, AppError>;

    /// Cria o tenant, o plano de governo e o usuário inicial de forma atômica.
    async fn create(
        &self,
        tenant: NewTenant,
        plan: Option<NewGovernmentPlan>,
        owner: Option<NewUser>,
    ) -> Result<Tenant, AppError>;

    /// Todos os tenants, mais novos primeiro.
    async fn list(&self) -> Result<Vec<Tenant>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError>;

    async fn find_active_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError>;

    /// Desativação lógica. `false` se o tenant não existe.
    async fn deactivate(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantStore for PgTenantRepository {
    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE subdomain = $1)")
                .bind(subdomain)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn create(
        &self,
        tenant: NewTenant,
        plan: Option<NewGovernmentPlan>,
        owner: Option<NewUser>,
    ) -> Result<Tenant, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o tenant (a unique index cobre a corrida entre dois admins)
        let subdomain = tenant.subdomain.clone();
        let created = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (id, subdomain, name, candidate_name, position, party,
                                 election_year, city, state, assigned_agent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.subdomain)
        .bind(&tenant.name)
        .bind(&tenant.candidate_name)
        .bind(&tenant.position)
        .bind(&tenant.party)
        .bind(tenant.election_year)
        .bind(&tenant.city)
        .bind(&tenant.state)
        .bind(tenant.assigned_agent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::SubdomainAlreadyExists(subdomain)))?;

        // 3. Plano de governo (tabela com RLS: precisa da chave do tenant)
        if let Some(plan) = plan {
            sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
                .bind(created.id.to_string())
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO government_plans (id, tenant_id, filename, file_path, strategic_axes)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(created.id)
            .bind(&plan.filename)
            .bind(&plan.file_path)
            .bind(&plan.strategic_axes)
            .execute(&mut *tx)
            .await?;
        }

        // 4. Usuário candidato inicial
        if let Some(owner) = owner {
            insert_user(&mut *tx, &owner).await?;
        }

        // 5. Commit
        tx.commit().await?;

        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(tenants)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tenant)
    }

    async fn find_active_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE subdomain = $1 AND is_active = true",
        )
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tenants SET is_active = false, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
