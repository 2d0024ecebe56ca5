// src/handlers/ingest.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::electoral::{DataType, UploadFilePayload, UploadResponse},
};

// POST /api/ingest/{dataType}
// Falhas de arquivo voltam como `success: false` com 200; só falta de tenant
// ou payload malformado viram erro HTTP.
#[utoipa::path(
    post,
    path = "/api/ingest/{data_type}",
    tag = "Ingest",
    params(("data_type" = DataType, Path, description = "elections, ibge ou polls")),
    request_body = UploadFilePayload,
    responses(
        (status = 200, description = "Resultado do upload; o processamento segue em segundo plano", body = UploadResponse),
        (status = 400, description = "Tenant obrigatório")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(data_type): Path<DataType>,
    Json(payload): Json<UploadFilePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .ingest_service
        .upload(tenant.tenant_id, &tenant.auth.email, data_type, payload)
        .await;

    Ok(Json(response))
}
