// src/handlers/agent_tasks.rs

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
    models::agents::{
        AgentTask, CreateAgentTaskPayload, CreateAgentTaskResponse, ListAgentTasksResponse,
    },
};

// POST /api/agents/tasks
#[utoipa::path(
    post,
    path = "/api/agents/tasks",
    tag = "Agents",
    request_body = CreateAgentTaskPayload,
    responses(
        (status = 201, description = "Tarefa enfileirada (processamento assíncrono)", body = CreateAgentTaskResponse),
        (status = 400, description = "Tenant obrigatório ou dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateAgentTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let task = app_state
        .agent_service
        .create_task(tenant.tenant_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAgentTaskResponse {
            task_id: task.id,
            status: task.status,
        }),
    ))
}

// GET /api/agents/tasks
#[utoipa::path(
    get,
    path = "/api/agents/tasks",
    tag = "Agents",
    responses((status = 200, description = "Tarefas do candidato, mais novas primeiro", body = ListAgentTasksResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = app_state
        .agent_service
        .list_tasks(tenant.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ListAgentTasksResponse { tasks }))
}

// GET /api/agents/tasks/{id}
#[utoipa::path(
    get,
    path = "/api/agents/tasks/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Estado atual da tarefa", body = AgentTask),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_task(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let task = app_state
        .agent_service
        .get_task(tenant.tenant_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}
