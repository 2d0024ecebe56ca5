// src/services/dashboard_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ElectoralStore, InsightStore, TaskStore},
    models::{
        dashboard::{DashboardResponse, DashboardStats},
        electoral::MapDataResponse,
    },
};

const RECENT_INSIGHTS: i64 = 5;
const UPCOMING_TASKS: i64 = 5;
// Quantas pesquisas entram na média de intenção
const POLLS_IN_RATING: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    electoral: Arc<dyn ElectoralStore>,
    insights: Arc<dyn InsightStore>,
    tasks: Arc<dyn TaskStore>,
}

impl DashboardService {
    pub fn new(
        electoral: Arc<dyn ElectoralStore>,
        insights: Arc<dyn InsightStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            electoral,
            insights,
            tasks,
        }
    }

    pub async fn get_dashboard(&self, tenant_id: Uuid) -> Result<DashboardResponse, AppError> {
        // Consultas independentes rodam juntas
        let (votes, poll_rating, active_insights, pending_tasks, recent, upcoming) = tokio::try_join!(
            self.electoral.vote_stats(tenant_id),
            self.electoral.poll_rating(tenant_id, POLLS_IN_RATING),
            self.insights.count_unread(tenant_id),
            self.tasks.count_pending(tenant_id),
            self.insights.list(tenant_id, Some(RECENT_INSIGHTS)),
            self.tasks.upcoming_pending(tenant_id, UPCOMING_TASKS),
        )?;

        Ok(DashboardResponse {
            stats: DashboardStats {
                total_votes: votes.total_votes,
                voting_percentage: votes.vote_percentage,
                poll_rating,
                active_insights,
                pending_tasks,
            },
            recent_insights: recent.into_iter().map(Into::into).collect(),
            upcoming_tasks: upcoming.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn get_map(&self, tenant_id: Uuid) -> Result<MapDataResponse, AppError> {
        let zones = self.electoral.zones(tenant_id).await?;
        Ok(MapDataResponse {
            zones: zones.into_iter().map(Into::into).collect(),
        })
    }
}
