// src/models/agents.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// 1. Agent (perfil de estratégia)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    #[schema(example = "Analista de Pesquisas")]
    pub name: String,
    pub description: Option<String>,
    // Chave do classificador: data_analysis, poll_analysis, strategy, content...
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    #[schema(example = "poll_analysis")]
    pub agent_type: String,
    pub strategy_focus: Option<String>,
    pub capabilities: Vec<String>,
    pub status: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAgent {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub agent_type: String,
    pub strategy_focus: Option<String>,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentPayload {
    #[validate(length(min = 1, message = "O nome do agente é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "O tipo do agente é obrigatório."))]
    pub agent_type: String,
    pub strategy_focus: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Atualização parcial de agente.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: Option<String>,
    pub strategy_focus: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub status: Option<String>,
}

impl AgentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.agent_type.is_none()
            && self.strategy_focus.is_none()
            && self.capabilities.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListAgentsResponse {
    pub agents: Vec<Agent>,
}

// ---
// 2. AgentTask (pedido de processamento, com máquina de estados)
// ---

// Mapeia o CREATE TYPE agent_task_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "agent_task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgentTaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AgentTaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentTaskStatus::Completed | AgentTaskStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentTask {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    pub agent_id: Uuid,
    pub task_type: String,
    #[schema(value_type = Object)]
    pub input_data: Value,
    pub status: AgentTaskStatus,
    #[schema(value_type = Option<Object>)]
    pub output_data: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewAgentTask {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub agent_id: Uuid,
    pub task_type: String,
    pub input_data: Value,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentTaskPayload {
    pub agent_id: Uuid,
    #[validate(length(min = 1, message = "O tipo da tarefa é obrigatório."))]
    pub task_type: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub input_data: Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentTaskResponse {
    pub task_id: Uuid,
    pub status: AgentTaskStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListAgentTasksResponse {
    pub tasks: Vec<AgentTask>,
}

// ---
// 3. Base de conhecimento do agente
// ---
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeFile {
    #[validate(length(min = 1, message = "O nome do arquivo é obrigatório."))]
    pub filename: String,
    /// Conteúdo em base64
    pub content: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UploadKnowledgePayload {
    #[validate(length(min = 1, message = "Envie ao menos um arquivo."), nested)]
    pub files: Vec<KnowledgeFile>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadKnowledgeResponse {
    pub message: String,
    pub files_processed: usize,
    pub file_paths: Vec<String>,
}

// ---
// 4. Plano de ação (resposta simulada)
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateActionPlanPayload {
    pub tenant_id: Uuid,
    pub agent_id: Uuid,
    #[serde(default)]
    pub strategic_axes: std::collections::HashMap<String, f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoreValues {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationProfile {
    pub tone: String,
    pub key_messages: Vec<String>,
    pub target_audience: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TacticalAction {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub due_date: chrono::NaiveDate,
    pub category: String,
    pub estimated_hours: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    pub tenant_id: Uuid,
    pub agent_id: Uuid,
    pub core_values: CoreValues,
    pub communication_profile: CommunicationProfile,
    pub tactical_actions: Vec<TacticalAction>,
    pub generated_at: DateTime<Utc>,
}
