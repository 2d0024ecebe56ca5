// src/services/task_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InsightStore, TaskStore},
    models::{
        insights::Insight,
        tasks::{CreateTaskPayload, NewTask, Task, TaskPatch},
    },
};

/// Tarefas de campanha e insights do candidato. Tudo com escopo de tenant.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    insights: Arc<dyn InsightStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, insights: Arc<dyn InsightStore>) -> Self {
        Self { tasks, insights }
    }

    pub async fn list_tasks(&self, tenant_id: Uuid) -> Result<Vec<Task>, AppError> {
        self.tasks.list(tenant_id).await
    }

    pub async fn create_task(&self, tenant_id: Uuid, payload: CreateTaskPayload) -> Result<Task, AppError> {
        self.tasks
            .create(NewTask {
                id: Uuid::new_v4(),
                tenant_id,
                title: payload.title,
                description: payload.description,
                priority: payload.priority,
                due_date: payload.due_date,
                assigned_to: payload.assigned_to,
            })
            .await
    }

    /// Só os campos presentes são aplicados. Sem campos: erro, e a linha fica como está.
    pub async fn update_task(&self, tenant_id: Uuid, id: Uuid, patch: TaskPatch) -> Result<Task, AppError> {
        if patch.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }
        self.tasks
            .update(tenant_id, id, &patch)
            .await?
            .ok_or(AppError::NotFound("task"))
    }

    pub async fn list_insights(&self, tenant_id: Uuid) -> Result<Vec<Insight>, AppError> {
        self.insights.list(tenant_id, None).await
    }

    pub async fn mark_insight_read(&self, tenant_id: Uuid, id: Uuid) -> Result<Insight, AppError> {
        self.insights
            .mark_read(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound("insight"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{
            insights::NewInsight,
            tasks::{Priority, TaskStatus},
        },
    };
    use serde_json::json;

    fn service() -> (TaskService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (TaskService::new(store.clone(), store.clone()), store)
    }

    fn payload(title: &str) -> CreateTaskPayload {
        CreateTaskPayload {
            title: title.into(),
            description: None,
            priority: Priority::Medium,
            due_date: None,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn empty_patch_leaves_row_unchanged() {
        let (svc, _) = service();
        let tenant_id = Uuid::new_v4();
        let task = svc.create_task(tenant_id, payload("Panfletagem")).await.unwrap();

        let err = svc.update_task(tenant_id, task.id, TaskPatch::default()).await.unwrap_err();

        assert!(matches!(err, AppError::NoFieldsToUpdate));
        let stored = &svc.list_tasks(tenant_id).await.unwrap()[0];
        assert_eq!(stored.title, "Panfletagem");
        assert_eq!(stored.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn reopening_keeps_the_last_completion() {
        let (svc, _) = service();
        let tenant_id = Uuid::new_v4();
        let task = svc.create_task(tenant_id, payload("Debate")).await.unwrap();

        let done = svc
            .update_task(
                tenant_id,
                task.id,
                TaskPatch {
                    status: Some(TaskStatus::Completed),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        let stamped = done.completed_at.unwrap();

        let reopened = svc
            .update_task(
                tenant_id,
                task.id,
                TaskPatch {
                    status: Some(TaskStatus::InProgress),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(reopened.status, TaskStatus::InProgress);
        assert_eq!(reopened.completed_at, Some(stamped));
    }

    #[tokio::test]
    async fn other_tenant_cannot_update() {
        let (svc, _) = service();
        let owner = Uuid::new_v4();
        let task = svc.create_task(owner, payload("Comício")).await.unwrap();

        let patch = TaskPatch {
            title: Some("invadido".into()),
            ..TaskPatch::default()
        };
        let err = svc.update_task(Uuid::new_v4(), task.id, patch).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound("task")));
        assert_eq!(svc.list_tasks(owner).await.unwrap()[0].title, "Comício");
    }

    #[tokio::test]
    async fn insight_can_be_marked_read_only_in_its_tenant() {
        let (svc, store) = service();
        let tenant_id = Uuid::new_v4();
        let insight = InsightStore::create(
            store.as_ref(),
            NewInsight {
                id: Uuid::new_v4(),
                tenant_id,
                title: "Tendência".into(),
                description: "Alta de 3%".into(),
                insight_type: "poll_analysis".into(),
                data: json!({}),
                priority: Priority::High,
            },
        )
        .await
        .unwrap();

        assert!(svc.mark_insight_read(Uuid::new_v4(), insight.id).await.is_err());
        assert!(svc.mark_insight_read(tenant_id, insight.id).await.unwrap().is_read);
    }
}
