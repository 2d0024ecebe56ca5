// src/services/agent_pipeline.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    db::{AgentStore, AgentTaskStore, InsightStore},
    events::{
        AgentTaskCompleted, AgentTaskCreated, Envelope, EventBus, EventHandler, Notification,
        NotificationKind,
    },
    models::{agents::Agent, insights::NewInsight, tasks::Priority},
    services::classifier::AgentClassifier,
};

pub const CONSUMER: &str = "process-agent-tasks";

/// Consumidor de `AgentTaskCreated`: pending -> processing -> completed|failed.
pub struct AgentPipeline {
    agents: Arc<dyn AgentStore>,
    agent_tasks: Arc<dyn AgentTaskStore>,
    insights: Arc<dyn InsightStore>,
    classifier: Arc<dyn AgentClassifier>,
    bus: EventBus,
    timeout: Duration,
}

impl AgentPipeline {
    pub fn new(
        agents: Arc<dyn AgentStore>,
        agent_tasks: Arc<dyn AgentTaskStore>,
        insights: Arc<dyn InsightStore>,
        classifier: Arc<dyn AgentClassifier>,
        bus: EventBus,
        timeout: Duration,
    ) -> Self {
        Self {
            agents,
            agent_tasks,
            insights,
            classifier,
            bus,
            timeout,
        }
    }

    /// Etapas 2 a 4: carrega o agente, classifica e registra o insight.
    async fn run(&self, created: &AgentTaskCreated, cancel: &CancellationToken) -> anyhow::Result<Value> {
        let agent = self
            .agents
            .find(created.agent_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Agent not found: {}", created.agent_id))?;

        // Nenhuma conexão do banco fica presa durante a espera
        let output = tokio::select! {
            _ = cancel.cancelled() => anyhow::bail!("Agent task cancelled by shutdown"),
            result = tokio::time::timeout(
                self.timeout,
                self.classifier.classify(&agent.agent_type, &created.input_data),
            ) => match result {
                Ok(output) => output?,
                Err(_) => anyhow::bail!("Agent task timed out after {}s", self.timeout.as_secs()),
            },
        };

        if !self
            .agent_tasks
            .mark_completed(created.tenant_id, created.task_id, &output)
            .await?
        {
            anyhow::bail!("Agent task left the processing state");
        }

        // A linha já está concluída: falha no insight não pode virar `failed`
        if let Err(e) = self.record_insight(created.tenant_id, &agent, &output).await {
            tracing::error!(task_id = %created.task_id, "falha ao registrar o insight: {:#}", e);
        }
        Ok(output)
    }

    async fn record_insight(&self, tenant_id: Uuid, agent: &Agent, output: &Value) -> anyhow::Result<()> {
        let Some(insight) = output.get("insight") else {
            return Ok(());
        };

        let text = |key: &str| insight.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        let priority = insight
            .get("priority")
            .cloned()
            .and_then(|p| serde_json::from_value::<Priority>(p).ok())
            .unwrap_or_default();

        let created = self
            .insights
            .create(NewInsight {
                id: Uuid::new_v4(),
                tenant_id,
                title: text("title"),
                description: text("description"),
                insight_type: agent.agent_type.clone(),
                data: output.clone(),
                priority,
            })
            .await?;

        tracing::info!(tenant_id = %tenant_id, insight_id = %created.id, "💡 Insight gerado");

        self.bus.notification().publish(Notification {
            tenant_id,
            kind: NotificationKind::Insight,
            title: created.title,
            message: created.description,
            priority: created.priority,
        });
        Ok(())
    }
}

#[async_trait]
impl EventHandler<AgentTaskCreated> for AgentPipeline {
    fn name(&self) -> &'static str {
        CONSUMER
    }

    async fn handle(&self, event: &Envelope<AgentTaskCreated>) -> anyhow::Result<()> {
        let created = &event.payload;

        // Só quem consegue a transição pending -> processing segue
        if !self
            .agent_tasks
            .mark_processing(created.tenant_id, created.task_id)
            .await?
        {
            tracing::info!(
                event_id = %event.id,
                task_id = %created.task_id,
                "tarefa não está pendente, ignorando reentrega"
            );
            return Ok(());
        }

        tracing::info!(
            event_id = %event.id,
            task_id = %created.task_id,
            tenant_id = %created.tenant_id,
            task_type = %created.task_type,
            "🤖 Processando tarefa de agente"
        );

        let cancel = self.bus.cancellation_token();
        match self.run(created, &cancel).await {
            Ok(output) => {
                tracing::info!(task_id = %created.task_id, "✅ Tarefa de agente concluída");
                self.bus.agent_task_completed().publish(AgentTaskCompleted {
                    task_id: created.task_id,
                    tenant_id: created.tenant_id,
                    agent_id: created.agent_id,
                    success: true,
                    output_data: Some(output),
                    error: None,
                });
            }
            Err(e) => {
                let error = format!("{:#}", e);
                tracing::error!(task_id = %created.task_id, "❌ Tarefa de agente falhou: {}", error);

                // Sem retry: a falha fica registrada na própria linha
                if !self
                    .agent_tasks
                    .mark_failed(created.tenant_id, created.task_id, &error)
                    .await?
                {
                    tracing::warn!(task_id = %created.task_id, "tarefa já saiu de processing, resultado descartado");
                    return Ok(());
                }

                self.bus.agent_task_completed().publish(AgentTaskCompleted {
                    task_id: created.task_id,
                    tenant_id: created.tenant_id,
                    agent_id: created.agent_id,
                    success: false,
                    output_data: None,
                    error: Some(error),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        events::DeliveryPolicy,
        models::agents::{AgentTaskStatus, NewAgent, NewAgentTask},
        services::classifier::MockClassifier,
    };
    use crate::{common::error::AppError, models::insights::Insight};
    use serde_json::json;

    /// Delega ao `MemoryStore`, mas toda criação de insight falha.
    struct BrokenInsights(Arc<MemoryStore>);

    #[async_trait]
    impl InsightStore for BrokenInsights {
        async fn create(&self, _insight: NewInsight) -> Result<Insight, AppError> {
            Err(AppError::InternalServerError(anyhow::anyhow!("insights indisponível")))
        }

        async fn list(&self, tenant_id: Uuid, limit: Option<i64>) -> Result<Vec<Insight>, AppError> {
            InsightStore::list(self.0.as_ref(), tenant_id, limit).await
        }

        async fn count_unread(&self, tenant_id: Uuid) -> Result<i64, AppError> {
            self.0.count_unread(tenant_id).await
        }

        async fn mark_read(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Insight>, AppError> {
            InsightStore::mark_read(self.0.as_ref(), tenant_id, id).await
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        bus: EventBus,
        pipeline: AgentPipeline,
    }

    fn harness(latency: Duration, timeout: Duration) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::new(DeliveryPolicy::default());
        let pipeline = AgentPipeline::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(MockClassifier::new(latency)),
            bus.clone(),
            timeout,
        );
        Harness { store, bus, pipeline }
    }

    async fn seed_agent(store: &MemoryStore, agent_type: &str) -> Uuid {
        AgentStore::create(
            store,
            NewAgent {
                id: Uuid::new_v4(),
                name: "Analista".into(),
                description: None,
                agent_type: agent_type.into(),
                strategy_focus: None,
                capabilities: vec![],
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_task(store: &MemoryStore, tenant_id: Uuid, agent_id: Uuid) -> Envelope<AgentTaskCreated> {
        let task = AgentTaskStore::create(
            store,
            NewAgentTask {
                id: Uuid::new_v4(),
                tenant_id,
                agent_id,
                task_type: "analysis".into(),
                input_data: json!({ "zone": "001" }),
            },
        )
        .await
        .unwrap();

        Envelope::new(AgentTaskCreated {
            task_id: task.id,
            tenant_id,
            agent_id,
            task_type: task.task_type,
            input_data: task.input_data,
        })
    }

    #[tokio::test]
    async fn completes_task_and_records_insight() {
        let h = harness(Duration::ZERO, Duration::from_secs(5));
        let tenant_id = Uuid::new_v4();
        let agent_id = seed_agent(&h.store, "poll_analysis").await;
        let event = seed_task(&h.store, tenant_id, agent_id).await;
        let mut completed = h.bus.agent_task_completed().tap();
        let mut notifications = h.bus.notification().tap();

        h.pipeline.handle(&event).await.unwrap();

        let task = AgentTaskStore::find(h.store.as_ref(), tenant_id, event.payload.task_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.status, AgentTaskStatus::Completed);
        let started = task.started_at.unwrap();
        let finished = task.completed_at.unwrap();
        assert!(task.created_at <= started && started <= finished);

        let insights = InsightStore::list(h.store.as_ref(), tenant_id, None).await.unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].insight_type, "poll_analysis");
        assert_eq!(insights[0].priority, Priority::High);

        assert!(completed.recv().await.unwrap().payload.success);
        assert_eq!(notifications.recv().await.unwrap().payload.title, "Poll Trend Analysis");
    }

    #[tokio::test]
    async fn unknown_agent_fails_the_task() {
        let h = harness(Duration::ZERO, Duration::from_secs(5));
        let tenant_id = Uuid::new_v4();
        let event = seed_task(&h.store, tenant_id, Uuid::new_v4()).await;
        let mut completed = h.bus.agent_task_completed().tap();

        h.pipeline.handle(&event).await.unwrap();

        let task = AgentTaskStore::find(h.store.as_ref(), tenant_id, event.payload.task_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.status, AgentTaskStatus::Failed);
        assert!(task.error.unwrap().contains("Agent not found"));

        let result = completed.recv().await.unwrap().payload;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn classifier_timeout_fails_the_task() {
        let h = harness(Duration::from_secs(5), Duration::from_millis(20));
        let tenant_id = Uuid::new_v4();
        let agent_id = seed_agent(&h.store, "strategy").await;
        let event = seed_task(&h.store, tenant_id, agent_id).await;

        h.pipeline.handle(&event).await.unwrap();

        let task = AgentTaskStore::find(h.store.as_ref(), tenant_id, event.payload.task_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.status, AgentTaskStatus::Failed);
        assert!(task.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn redelivery_is_a_no_op() {
        let h = harness(Duration::ZERO, Duration::from_secs(5));
        let tenant_id = Uuid::new_v4();
        let agent_id = seed_agent(&h.store, "content").await;
        let event = seed_task(&h.store, tenant_id, agent_id).await;

        h.pipeline.handle(&event).await.unwrap();
        h.pipeline.handle(&event).await.unwrap();

        let insights = InsightStore::list(h.store.as_ref(), tenant_id, None).await.unwrap();
        assert_eq!(insights.len(), 1);
        let task = AgentTaskStore::find(h.store.as_ref(), tenant_id, event.payload.task_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.status, AgentTaskStatus::Completed);
    }

    #[tokio::test]
    async fn insight_failure_keeps_the_completed_result() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::new(DeliveryPolicy::default());
        let pipeline = AgentPipeline::new(
            store.clone(),
            store.clone(),
            Arc::new(BrokenInsights(store.clone())),
            Arc::new(MockClassifier::new(Duration::ZERO)),
            bus.clone(),
            Duration::from_secs(5),
        );
        let tenant_id = Uuid::new_v4();
        let agent_id = seed_agent(&store, "poll_analysis").await;
        let event = seed_task(&store, tenant_id, agent_id).await;
        let mut completed = bus.agent_task_completed().tap();
        let mut notifications = bus.notification().tap();

        pipeline.handle(&event).await.unwrap();

        let task = AgentTaskStore::find(store.as_ref(), tenant_id, event.payload.task_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.status, AgentTaskStatus::Completed);
        assert!(task.error.is_none());

        let result = completed.recv().await.unwrap().payload;
        assert!(result.success);
        assert!(result.output_data.is_some());
        assert!(completed.try_recv().is_err());
        assert!(notifications.try_recv().is_err());
    }
}
