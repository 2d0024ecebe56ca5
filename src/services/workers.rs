// src/services/workers.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    db::Repositories,
    events::{
        AgentTaskCompleted, DataProcessed, Envelope, EventBus, EventHandler, Notification,
    },
    services::{agent_pipeline::AgentPipeline, classifier::AgentClassifier, csv_worker::CsvWorker},
    storage::Buckets,
};

// ---
// Consumidores de log
// ---

struct NotificationLogger;

#[async_trait]
impl EventHandler<Notification> for NotificationLogger {
    fn name(&self) -> &'static str {
        "log-notifications"
    }

    async fn handle(&self, event: &Envelope<Notification>) -> anyhow::Result<()> {
        let n = &event.payload;
        tracing::info!(
            event_id = %event.id,
            tenant_id = %n.tenant_id,
            kind = ?n.kind,
            priority = ?n.priority,
            "🔔 {}: {}",
            n.title,
            n.message
        );
        Ok(())
    }
}

struct DataProcessedLogger;

#[async_trait]
impl EventHandler<DataProcessed> for DataProcessedLogger {
    fn name(&self) -> &'static str {
        "log-data-processed"
    }

    async fn handle(&self, event: &Envelope<DataProcessed>) -> anyhow::Result<()> {
        let p = &event.payload;
        if p.success {
            tracing::info!(
                event_id = %event.id,
                tenant_id = %p.tenant_id,
                data_type = %p.data_type,
                records = p.records_processed,
                "📊 Dados processados"
            );
        } else {
            tracing::warn!(
                event_id = %event.id,
                tenant_id = %p.tenant_id,
                data_type = %p.data_type,
                records = p.records_processed,
                errors = ?p.errors,
                "📊 Dados processados com erros"
            );
        }
        Ok(())
    }
}

struct AgentTaskLogger;

#[async_trait]
impl EventHandler<AgentTaskCompleted> for AgentTaskLogger {
    fn name(&self) -> &'static str {
        "log-agent-tasks"
    }

    async fn handle(&self, event: &Envelope<AgentTaskCompleted>) -> anyhow::Result<()> {
        let c = &event.payload;
        if c.success {
            tracing::info!(task_id = %c.task_id, tenant_id = %c.tenant_id, "🤖 Tarefa de agente finalizada");
        } else {
            tracing::warn!(
                task_id = %c.task_id,
                tenant_id = %c.tenant_id,
                error = c.error.as_deref().unwrap_or_default(),
                "🤖 Tarefa de agente falhou"
            );
        }
        Ok(())
    }
}

/// Liga todos os consumidores ao barramento. Chamado uma vez na subida.
pub fn register(
    bus: &EventBus,
    repos: &Repositories,
    buckets: &Buckets,
    classifier: Arc<dyn AgentClassifier>,
    agent_timeout: Duration,
) {
    bus.data_uploaded().subscribe(Arc::new(CsvWorker::new(
        repos.electoral.clone(),
        repos.receipts.clone(),
        buckets.uploads.clone(),
        bus.clone(),
    )));

    bus.agent_task_created().subscribe(Arc::new(AgentPipeline::new(
        repos.agents.clone(),
        repos.agent_tasks.clone(),
        repos.insights.clone(),
        classifier,
        bus.clone(),
        agent_timeout,
    )));

    bus.notification().subscribe(Arc::new(NotificationLogger));
    bus.data_processed().subscribe(Arc::new(DataProcessedLogger));
    bus.agent_task_completed().subscribe(Arc::new(AgentTaskLogger));

    tracing::info!("⚙️ Consumidores de eventos registrados");
}
