// src/handlers/insights.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::insights::{Insight, ListInsightsResponse},
};

// GET /api/candidates/insights
#[utoipa::path(
    get,
    path = "/api/candidates/insights",
    tag = "Insights",
    responses((status = 200, description = "Insights do candidato, mais novos primeiro", body = ListInsightsResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_insights(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let insights = app_state
        .task_service
        .list_insights(tenant.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ListInsightsResponse { insights }))
}

// PUT /api/candidates/insights/{id}/read
#[utoipa::path(
    put,
    path = "/api/candidates/insights/{id}/read",
    tag = "Insights",
    params(("id" = Uuid, Path, description = "ID do insight")),
    responses(
        (status = 200, description = "Insight marcado como lido", body = Insight),
        (status = 404, description = "Insight não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let insight = app_state
        .task_service
        .mark_insight_read(tenant.tenant_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(insight))
}
