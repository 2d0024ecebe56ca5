// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{AuthContext, Role},
};

/// 1. O Trait que define o papel exigido
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> Role;
}

/// 2. O Extractor (Guardião). Carrega o contexto para o handler não extrair de novo.
pub struct RequireRole<T> {
    pub auth: AuthContext,
    _role: PhantomData<T>,
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        // A. Extrai Usuário
        let AuthenticatedUser(auth) = AuthenticatedUser::from_request_parts(parts, state)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Compara o papel
        let required = T::role();
        if auth.role != required {
            tracing::warn!(user_id = %auth.user_id, required = required.as_str(), "acesso negado");
            return Err(AppError::PermissionDenied(required.as_str())
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole {
            auth,
            _role: PhantomData,
        })
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct AdminRole;
impl RoleDef for AdminRole {
    fn role() -> Role {
        Role::Admin
    }
}
