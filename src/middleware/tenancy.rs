// src/middleware/tenancy.rs

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::AuthContext,
};

// O nome do nosso cabeçalho HTTP customizado
const SUBDOMAIN_HEADER: &str = "x-subdomain";

/// Subdomínio pedido pelo cliente (opcional). Só tem efeito para admins.
#[derive(Debug, Clone, Default)]
pub struct SubdomainHint(pub Option<String>);

impl<S> FromRequestParts<S> for SubdomainHint
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let hint = parts
            .headers
            .get(SUBDOMAIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty());

        Ok(SubdomainHint(hint))
    }
}

/// Chamador com tenant resolvido. Toda rota de candidato começa por aqui.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub auth: AuthContext,
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        let AuthenticatedUser(auth) = AuthenticatedUser::from_request_parts(parts, state)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        let tenant_id = auth
            .tenant_id
            .ok_or(AppError::TenantRequired)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        Ok(TenantContext { tenant_id, auth })
    }
}
