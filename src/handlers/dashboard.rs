// src/handlers/dashboard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::{dashboard::DashboardResponse, electoral::MapDataResponse},
};

// GET /api/candidates/dashboard
#[utoipa::path(
    get,
    path = "/api/candidates/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Indicadores, insights recentes e próximas tarefas", body = DashboardResponse),
        (status = 400, description = "Tenant obrigatório"),
        (status = 401, description = "Não autorizado")
    ),
    params(
        ("x-subdomain" = Option<String>, Header, description = "Subdomínio do candidato (só admins)")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = app_state
        .dashboard_service
        .get_dashboard(tenant.tenant_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(dashboard)))
}

// GET /api/candidates/map
#[utoipa::path(
    get,
    path = "/api/candidates/map",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Votos e demografia por zona eleitoral", body = MapDataResponse),
        (status = 400, description = "Tenant obrigatório")
    ),
    params(
        ("x-subdomain" = Option<String>, Header, description = "Subdomínio do candidato (só admins)")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_map(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let map = app_state
        .dashboard_service
        .get_map(tenant.tenant_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(map)))
}
