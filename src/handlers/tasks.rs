// src/handlers/tasks.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::tasks::{CreateTaskPayload, ListTasksResponse, Task, UpdateTaskPayload},
};

// GET /api/candidates/tasks
#[utoipa::path(
    get,
    path = "/api/candidates/tasks",
    tag = "Tasks",
    responses((status = 200, description = "Tarefas por prioridade e prazo", body = ListTasksResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = app_state
        .task_service
        .list_tasks(tenant.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ListTasksResponse { tasks }))
}

// POST /api/candidates/tasks
#[utoipa::path(
    post,
    path = "/api/candidates/tasks",
    tag = "Tasks",
    request_body = CreateTaskPayload,
    responses(
        (status = 201, description = "Tarefa criada", body = Task),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let task = app_state
        .task_service
        .create_task(tenant.tenant_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(task)))
}

// PUT /api/candidates/tasks
#[utoipa::path(
    put,
    path = "/api/candidates/tasks",
    tag = "Tasks",
    request_body = UpdateTaskPayload,
    responses(
        (status = 200, description = "Tarefa atualizada", body = Task),
        (status = 400, description = "Nenhum campo para atualizar"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_task(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let task = app_state
        .task_service
        .update_task(tenant.tenant_id, payload.id, payload.patch)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}
