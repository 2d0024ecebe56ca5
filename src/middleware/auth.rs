// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::SubdomainHint},
    models::auth::AuthContext,
};

// O guardião: resolve o token (e o subdomínio, para admins) antes de qualquer handler
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    hint: SubdomainHint,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Cabeçalho ausente ou que não seja "Bearer <token>" dá no mesmo: 401
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let context = app_state
        .auth_service
        .resolve(bearer.token(), hint.0.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Insere o contexto nos "extensions" da requisição
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

// Extrator para obter o contexto autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthContext);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}
