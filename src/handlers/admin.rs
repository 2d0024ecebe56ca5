// src/handlers/admin.rs

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
    middleware::{
        i18n::Locale,
        rbac::{AdminRole, RequireRole},
    },
    models::{
        agents::{
            ActionPlan, Agent, AgentPatch, CreateAgentPayload, GenerateActionPlanPayload,
            ListAgentsResponse, UploadKnowledgePayload, UploadKnowledgeResponse,
        },
        tenancy::{CreateCandidatePayload, CreateCandidateResponse, ListCandidatesResponse},
    },
};

// ---
// CANDIDATOS (TENANTS)
// ---

// POST /api/admin/candidates
#[utoipa::path(
    post,
    path = "/api/admin/candidates",
    tag = "Admin",
    request_body = CreateCandidatePayload,
    responses(
        (status = 201, description = "Candidato criado", body = CreateCandidateResponse),
        (status = 400, description = "Dados inválidos ou subdomínio em uso"),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_candidate(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
    Json(payload): Json<CreateCandidatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tenant = app_state
        .tenant_service
        .create_candidate(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateCandidateResponse {
            id: tenant.id,
            subdomain: tenant.subdomain,
        }),
    ))
}

// GET /api/admin/candidates
#[utoipa::path(
    get,
    path = "/api/admin/candidates",
    tag = "Admin",
    responses(
        (status = 200, description = "Todos os candidatos, mais novos primeiro", body = ListCandidatesResponse),
        (status = 403, description = "Apenas admins")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_candidates(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
) -> Result<impl IntoResponse, ApiError> {
    let candidates = app_state
        .tenant_service
        .list_candidates()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ListCandidatesResponse { candidates }))
}

// DELETE /api/admin/candidates/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/candidates/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do candidato")),
    responses(
        (status = 204, description = "Candidato desativado"),
        (status = 404, description = "Candidato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_candidate(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenant_service
        .deactivate_candidate(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// AGENTES
// ---

// GET /api/admin/agents
#[utoipa::path(
    get,
    path = "/api/admin/agents",
    tag = "Admin",
    responses((status = 200, description = "Todos os agentes, por nome", body = ListAgentsResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_agents(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
) -> Result<impl IntoResponse, ApiError> {
    let agents = app_state
        .agent_service
        .list_agents()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ListAgentsResponse { agents }))
}

// GET /api/admin/agents/active
#[utoipa::path(
    get,
    path = "/api/admin/agents/active",
    tag = "Admin",
    responses((status = 200, description = "Agentes ativos, mais novos primeiro", body = ListAgentsResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_active_agents(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
) -> Result<impl IntoResponse, ApiError> {
    let agents = app_state
        .agent_service
        .list_active_agents()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ListAgentsResponse { agents }))
}

// POST /api/admin/agents
#[utoipa::path(
    post,
    path = "/api/admin/agents",
    tag = "Admin",
    request_body = CreateAgentPayload,
    responses(
        (status = 201, description = "Agente criado", body = Agent),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
    Json(payload): Json<CreateAgentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let agent = app_state
        .agent_service
        .create_agent(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(agent)))
}

// GET /api/admin/agents/{id}
#[utoipa::path(
    get,
    path = "/api/admin/agents/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do agente")),
    responses(
        (status = 200, description = "Detalhe do agente", body = Agent),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let agent = app_state
        .agent_service
        .get_agent(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(agent))
}

// PUT /api/admin/agents/{id}
#[utoipa::path(
    put,
    path = "/api/admin/agents/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do agente")),
    request_body = AgentPatch,
    responses(
        (status = 200, description = "Agente atualizado", body = Agent),
        (status = 400, description = "Nenhum campo para atualizar"),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AgentPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let agent = app_state
        .agent_service
        .update_agent(id, patch)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(agent))
}

// DELETE /api/admin/agents/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/agents/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do agente")),
    responses(
        (status = 204, description = "Agente desativado"),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .agent_service
        .deactivate_agent(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/admin/agents/{id}/knowledge
#[utoipa::path(
    post,
    path = "/api/admin/agents/{id}/knowledge",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do agente")),
    request_body = UploadKnowledgePayload,
    responses(
        (status = 200, description = "Arquivos guardados", body = UploadKnowledgeResponse),
        (status = 400, description = "Arquivo inválido"),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_knowledge(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UploadKnowledgePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .agent_service
        .upload_knowledge(id, payload.files)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// POST /api/admin/action-plan
#[utoipa::path(
    post,
    path = "/api/admin/action-plan",
    tag = "Admin",
    request_body = GenerateActionPlanPayload,
    responses(
        (status = 200, description = "Plano de ação gerado", body = ActionPlan),
        (status = 404, description = "Candidato ou agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_action_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminRole>,
    Json(payload): Json<GenerateActionPlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .agent_service
        .generate_action_plan(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plan))
}
