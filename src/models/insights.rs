// src/models/insights.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::tasks::Priority;

// Observação derivada de uma AgentTask concluída. Só muda o "lido".
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub insight_type: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub priority: Priority,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInsight {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    pub insight_type: String,
    pub data: Value,
    pub priority: Priority,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListInsightsResponse {
    pub insights: Vec<Insight>,
}
