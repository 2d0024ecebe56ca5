// src/handlers/vault.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::vault::{Document, DownloadDocumentResponse, ListDocumentsResponse, UploadDocumentPayload},
};

// GET /api/candidates/vault
#[utoipa::path(
    get,
    path = "/api/candidates/vault",
    tag = "Vault",
    responses((status = 200, description = "Metadados dos documentos, mais novos primeiro", body = ListDocumentsResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_documents(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let documents = app_state
        .vault_service
        .list(tenant.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ListDocumentsResponse { documents }))
}

// POST /api/candidates/vault
#[utoipa::path(
    post,
    path = "/api/candidates/vault",
    tag = "Vault",
    request_body = UploadDocumentPayload,
    responses(
        (status = 201, description = "Documento guardado", body = Document),
        (status = 400, description = "Dados inválidos ou base64 malformado")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_document(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<UploadDocumentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let document = app_state
        .vault_service
        .upload(tenant.tenant_id, &tenant.auth.email, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(document)))
}

// GET /api/candidates/vault/{id}
#[utoipa::path(
    get,
    path = "/api/candidates/vault/{id}",
    tag = "Vault",
    params(("id" = Uuid, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "Conteúdo em base64", body = DownloadDocumentResponse),
        (status = 404, description = "Documento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_document(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let file = app_state
        .vault_service
        .download(tenant.tenant_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(file))
}
