// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::auth::{NewUser, User},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Busca pelo e-mail (ativo ou não), já com o subdomínio do tenant do usuário.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn create(&self, user: NewUser) -> Result<User, AppError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// INSERT reaproveitado pela criação de tenant (mesma transação).
pub(crate) async fn insert_user<'e, E>(executor: E, user: &NewUser) -> Result<User, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name, role, tenant_id, password_hash)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, email, name, role, tenant_id, is_active, password_hash, created_at
        "#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.role)
    .bind(user.tenant_id)
    .bind(&user.password_hash)
    .fetch_one(executor)
    .await
    .map_err(|e| map_unique_violation(e, || AppError::EmailAlreadyExists(user.email.clone())))
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.name, u.role, u.tenant_id, u.is_active,
                   u.password_hash, u.created_at, t.subdomain
            FROM users u
            LEFT JOIN tenants t ON t.id = u.tenant_id
            WHERE u.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        insert_user(&self.pool, &user).await
    }
}
