// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Admin ---
        handlers::admin::create_candidate,
        handlers::admin::list_candidates,
        handlers::admin::deactivate_candidate,
        handlers::admin::list_agents,
        handlers::admin::list_active_agents,
        handlers::admin::create_agent,
        handlers::admin::get_agent,
        handlers::admin::update_agent,
        handlers::admin::delete_agent,
        handlers::admin::upload_knowledge,
        handlers::admin::generate_action_plan,

        // --- Agents ---
        handlers::agent_tasks::create_task,
        handlers::agent_tasks::list_tasks,
        handlers::agent_tasks::get_task,

        // --- Dashboard ---
        handlers::dashboard::get_dashboard,
        handlers::dashboard::get_map,

        // --- Tasks ---
        handlers::tasks::list_tasks,
        handlers::tasks::create_task,
        handlers::tasks::update_task,

        // --- Vault ---
        handlers::vault::list_documents,
        handlers::vault::upload_document,
        handlers::vault::download_document,

        // --- Insights ---
        handlers::insights::list_insights,
        handlers::insights::mark_read,

        // --- Ingest ---
        handlers::ingest::upload,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::AuthContext,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::GovernmentPlan,
            models::tenancy::GovernmentPlanPayload,
            models::tenancy::InitialUserPayload,
            models::tenancy::CreateCandidatePayload,
            models::tenancy::CreateCandidateResponse,
            models::tenancy::ListCandidatesResponse,

            // --- Agents ---
            models::agents::Agent,
            models::agents::CreateAgentPayload,
            models::agents::AgentPatch,
            models::agents::ListAgentsResponse,
            models::agents::AgentTaskStatus,
            models::agents::AgentTask,
            models::agents::CreateAgentTaskPayload,
            models::agents::CreateAgentTaskResponse,
            models::agents::ListAgentTasksResponse,
            models::agents::KnowledgeFile,
            models::agents::UploadKnowledgePayload,
            models::agents::UploadKnowledgeResponse,
            models::agents::GenerateActionPlanPayload,
            models::agents::CoreValues,
            models::agents::CommunicationProfile,
            models::agents::TacticalAction,
            models::agents::ActionPlan,

            // --- Dashboard ---
            models::dashboard::DashboardStats,
            models::dashboard::RecentInsight,
            models::dashboard::UpcomingTask,
            models::dashboard::DashboardResponse,
            models::electoral::Demographics,
            models::electoral::MapZone,
            models::electoral::MapDataResponse,

            // --- Tasks & Insights ---
            models::tasks::Priority,
            models::tasks::TaskStatus,
            models::tasks::Task,
            models::tasks::CreateTaskPayload,
            models::tasks::TaskPatch,
            models::tasks::UpdateTaskPayload,
            models::tasks::ListTasksResponse,
            models::insights::Insight,
            models::insights::ListInsightsResponse,

            // --- Vault ---
            models::vault::Document,
            models::vault::UploadDocumentPayload,
            models::vault::DownloadDocumentResponse,
            models::vault::ListDocumentsResponse,

            // --- Ingest ---
            models::electoral::DataType,
            models::electoral::UploadFilePayload,
            models::electoral::UploadResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Login e contexto do chamador"),
        (name = "Admin", description = "Gestão de candidatos e agentes (apenas admins)"),
        (name = "Agents", description = "Tarefas assíncronas de agentes"),
        (name = "Dashboard", description = "Indicadores e mapa eleitoral"),
        (name = "Tasks", description = "Tarefas de campanha"),
        (name = "Insights", description = "Insights gerados pelos agentes"),
        (name = "Vault", description = "Cofre de documentos"),
        (name = "Ingest", description = "Upload de dados eleitorais, IBGE e pesquisas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
