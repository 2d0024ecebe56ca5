// src/models/vault.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Metadados do documento; o conteúdo mora no bucket do cofre
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    #[schema(example = "plano_de_governo.pdf")]
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    #[schema(example = "application/pdf")]
    pub content_type: String,
    pub size_bytes: i64,
    #[serde(skip_serializing)]
    pub file_path: String,
    pub tags: Vec<String>,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub file_path: String,
    pub tags: Vec<String>,
    pub uploaded_by: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentPayload {
    #[validate(length(min = 1, message = "O nome do documento é obrigatório."))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "O tipo (MIME) é obrigatório."))]
    pub content_type: String,
    /// Conteúdo em base64
    pub file_data: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDocumentResponse {
    pub file_name: String,
    /// Conteúdo em base64
    pub file_data: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListDocumentsResponse {
    pub documents: Vec<Document>,
}
