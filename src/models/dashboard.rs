// src/models/dashboard.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    insights::Insight,
    tasks::{Priority, Task},
};

// 1. Os Cards do Topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_votes: i64,      // Soma dos votos importados
    pub voting_percentage: f64, // Média do percentual por seção
    pub poll_rating: f64,      // Intenção média nas 5 pesquisas mais recentes
    pub active_insights: i64,  // Insights não lidos
    pub pending_tasks: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentInsight {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub insight_type: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl From<Insight> for RecentInsight {
    fn from(i: Insight) -> Self {
        Self {
            id: i.id,
            title: i.title,
            description: i.description,
            insight_type: i.insight_type,
            priority: i.priority,
            created_at: i.created_at,
            is_read: i.is_read,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTask {
    pub id: Uuid,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl From<Task> for UpcomingTask {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            due_date: t.due_date,
            priority: t.priority,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_insights: Vec<RecentInsight>,
    pub upcoming_tasks: Vec<UpcomingTask>,
}
