// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// 1. Tenant (O "Candidato")
// ---
// A partição isolada de dados de uma candidatura, endereçada pelo subdomínio
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "joaosilva2024")]
    pub subdomain: String,
    #[schema(example = "Campanha João Silva")]
    pub name: String,
    pub candidate_name: String,
    #[schema(example = "Vereador")]
    pub position: String,
    pub party: Option<String>,
    pub election_year: i32,
    pub city: String,
    pub state: String,
    pub is_active: bool,
    pub assigned_agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Linha a inserir; o ID é gerado pelo serviço para poder montar caminhos antes do INSERT.
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub id: Uuid,
    pub subdomain: String,
    pub name: String,
    pub candidate_name: String,
    pub position: String,
    pub party: Option<String>,
    pub election_year: i32,
    pub city: String,
    pub state: String,
    pub assigned_agent_id: Option<Uuid>,
}

// ---
// 2. Plano de Governo (opcional na criação)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GovernmentPlan {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub filename: String,
    pub file_path: String,
    #[schema(value_type = Object)]
    pub strategic_axes: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGovernmentPlan {
    pub filename: String,
    pub file_path: String,
    pub strategic_axes: Value,
}

// ---
// Payloads (O "Formulário" da API)
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GovernmentPlanPayload {
    #[validate(length(min = 1, message = "O nome do arquivo é obrigatório."))]
    pub filename: String,
    /// Conteúdo em base64
    pub content: String,
    #[schema(value_type = Option<Object>)]
    pub strategic_axes: Option<Value>,
}

/// Usuário candidato criado junto com o tenant (mesma transação).
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitialUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidatePayload {
    #[validate(custom(function = "validate_subdomain"))]
    #[schema(example = "joaosilva2024")]
    pub subdomain: String,
    #[validate(length(min = 1, message = "O nome da campanha é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, message = "O nome do candidato é obrigatório."))]
    pub candidate_name: String,
    #[validate(length(min = 1, message = "O cargo é obrigatório."))]
    pub position: String,
    pub party: Option<String>,
    #[validate(range(min = 1990, max = 2100, message = "Ano de eleição inválido."))]
    pub election_year: i32,
    #[validate(length(min = 1, message = "A cidade é obrigatória."))]
    pub city: String,
    #[validate(length(min = 2, max = 2, message = "Use a sigla do estado (UF)."))]
    pub state: String,
    pub assigned_agent_id: Option<Uuid>,
    #[validate(nested)]
    pub government_plan: Option<GovernmentPlanPayload>,
    #[validate(nested)]
    pub owner: Option<InitialUserPayload>,
}

fn validate_subdomain(value: &str) -> Result<(), validator::ValidationError> {
    let valid = !value.is_empty()
        && value.len() <= 63
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !value.starts_with('-')
        && !value.ends_with('-');

    if valid {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("subdomain");
        err.message = Some("Use apenas letras minúsculas, números e hífen.".into());
        Err(err)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateResponse {
    pub id: Uuid,
    pub subdomain: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCandidatesResponse {
    pub candidates: Vec<Tenant>,
}
