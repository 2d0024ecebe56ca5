// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantStore, UserStore},
    models::auth::{AuthContext, Claims, NewUser, Role, User},
};

// Custo baixo nos testes; bcrypt no custo padrão leva segundos em build de debug
#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

/// Gera o hash fora do runtime assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, BCRYPT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

/// Segundos desde a época, como o JWT espera; datas antes de 1970 são erro.
fn epoch_seconds(at: chrono::DateTime<Utc>) -> Result<usize, AppError> {
    usize::try_from(at.timestamp())
        .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("instante fora do intervalo do JWT: {}", at)))
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tenants: Arc<dyn TenantStore>,
    jwt_secret: String,
    token_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tenants: Arc<dyn TenantStore>,
        jwt_secret: String,
        token_ttl_hours: i64,
    ) -> Self {
        Self {
            users,
            tenants,
            jwt_secret,
            token_ttl: chrono::Duration::hours(token_ttl_hours),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "🔑 Login realizado");
        self.issue_token(&user)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            exp: epoch_seconds(expires_at)?,
            iat: epoch_seconds(now)?,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    /// Resolve quem está chamando e em nome de qual tenant.
    /// Só leitura: nada é criado ou renovado aqui.
    pub async fn resolve(&self, token: &str, subdomain_hint: Option<&str>) -> Result<AuthContext, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?
        .claims;

        if claims.sub.is_nil() || claims.email.is_empty() || claims.name.is_empty() {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .users
            .find_by_email(&claims.email)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::UserNotFound)?;

        // Token antigo: o usuário mudou de id ou de papel desde a emissão
        if user.id != claims.sub || user.role != claims.role {
            return Err(AppError::InvalidToken);
        }

        let mut context = AuthContext {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            tenant_id: user.tenant_id,
            subdomain: user.subdomain,
        };

        // Admin escolhe o tenant pelo subdomínio; dica desconhecida ou inativa é ignorada
        if context.role == Role::Admin {
            if let Some(hint) = subdomain_hint.filter(|h| !h.is_empty()) {
                if let Some(tenant) = self.tenants.find_active_by_subdomain(hint).await? {
                    context.tenant_id = Some(tenant.id);
                    context.subdomain = Some(tenant.subdomain);
                }
            }
        }

        Ok(context)
    }

    /// Cria o primeiro admin se ainda não existir ninguém com esse e-mail.
    pub async fn bootstrap_admin(&self, email: &str, password: &str, name: &str) -> Result<bool, AppError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Ok(false);
        }

        let password_hash = hash_password(password).await?;
        self.users
            .create(NewUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                name: name.to_string(),
                role: Role::Admin,
                tenant_id: None,
                password_hash,
            })
            .await?;

        tracing::info!(email, "👤 Admin inicial criado");
        Ok(true)
    }
}
