// src/services/agent_service.rs

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AgentStore, AgentTaskStore, TenantStore},
    events::{AgentTaskCreated, EventBus},
    models::agents::{
        ActionPlan, Agent, AgentPatch, AgentTask, CommunicationProfile, CoreValues,
        CreateAgentPayload, CreateAgentTaskPayload, GenerateActionPlanPayload, KnowledgeFile,
        NewAgent, NewAgentTask, TacticalAction, UploadKnowledgeResponse,
    },
    storage::{object_key, ObjectStore},
};

/// Cadastro de agentes (admin) e pedidos de tarefa (candidato).
#[derive(Clone)]
pub struct AgentService {
    agents: Arc<dyn AgentStore>,
    agent_tasks: Arc<dyn AgentTaskStore>,
    tenants: Arc<dyn TenantStore>,
    vault: Arc<dyn ObjectStore>,
    bus: EventBus,
}

impl AgentService {
    pub fn new(
        agents: Arc<dyn AgentStore>,
        agent_tasks: Arc<dyn AgentTaskStore>,
        tenants: Arc<dyn TenantStore>,
        vault: Arc<dyn ObjectStore>,
        bus: EventBus,
    ) -> Self {
        Self {
            agents,
            agent_tasks,
            tenants,
            vault,
            bus,
        }
    }

    // ---
    // Cadastro (admin)
    // ---

    pub async fn list_agents(&self) -> Result<Vec<Agent>, AppError> {
        self.agents.list_all().await
    }

    pub async fn list_active_agents(&self) -> Result<Vec<Agent>, AppError> {
        self.agents.list_active().await
    }

    pub async fn get_agent(&self, id: Uuid) -> Result<Agent, AppError> {
        self.agents.find(id).await?.ok_or(AppError::NotFound("agent"))
    }

    pub async fn create_agent(&self, payload: CreateAgentPayload) -> Result<Agent, AppError> {
        let agent = self
            .agents
            .create(NewAgent {
                id: Uuid::new_v4(),
                name: payload.name,
                description: payload.description,
                agent_type: payload.agent_type,
                strategy_focus: payload.strategy_focus,
                capabilities: payload.capabilities,
            })
            .await?;

        tracing::info!(agent_id = %agent.id, agent_type = %agent.agent_type, "Agente criado");
        Ok(agent)
    }

    pub async fn update_agent(&self, id: Uuid, patch: AgentPatch) -> Result<Agent, AppError> {
        if patch.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }
        self.agents
            .update(id, &patch)
            .await?
            .ok_or(AppError::NotFound("agent"))
    }

    pub async fn deactivate_agent(&self, id: Uuid) -> Result<(), AppError> {
        if !self.agents.deactivate(id).await? {
            return Err(AppError::NotFound("agent"));
        }
        tracing::info!(agent_id = %id, "Agente desativado");
        Ok(())
    }

    /// Guarda os arquivos da base de conhecimento em `knowledge/{agentId}/...` no cofre.
    pub async fn upload_knowledge(
        &self,
        agent_id: Uuid,
        files: Vec<KnowledgeFile>,
    ) -> Result<UploadKnowledgeResponse, AppError> {
        self.get_agent(agent_id).await?;

        // Decodifica tudo antes de gravar: um arquivo inválido não deixa metade no bucket
        let decoded = files
            .into_iter()
            .map(|file| -> Result<_, AppError> { Ok((STANDARD.decode(file.content.trim())?, file)) })
            .collect::<Result<Vec<_>, AppError>>()?;

        let mut file_paths = Vec::with_capacity(decoded.len());
        for (bytes, file) in decoded {
            let key = object_key("knowledge", agent_id, &file.filename);
            let content_type = file
                .content_type
                .as_deref()
                .unwrap_or("application/octet-stream");
            self.vault.put(&key, bytes, content_type).await?;
            file_paths.push(key);
        }

        let files_processed = file_paths.len();
        tracing::info!(agent_id = %agent_id, files_processed, "📚 Base de conhecimento atualizada");

        Ok(UploadKnowledgeResponse {
            message: format!("{} arquivos processados com sucesso", files_processed),
            files_processed,
            file_paths,
        })
    }

    /// Plano de ação simulado (estrutura fixa) para um candidato e um agente existentes.
    pub async fn generate_action_plan(&self, payload: GenerateActionPlanPayload) -> Result<ActionPlan, AppError> {
        self.tenants
            .find_by_id(payload.tenant_id)
            .await?
            .ok_or(AppError::NotFound("candidate"))?;
        self.get_agent(payload.agent_id).await?;

        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Ok(ActionPlan {
            tenant_id: payload.tenant_id,
            agent_id: payload.agent_id,
            core_values: CoreValues {
                primary: strings(&["Transparência", "Proximidade", "Eficiência"]),
                secondary: strings(&["Inovação", "Sustentabilidade"]),
            },
            communication_profile: CommunicationProfile {
                tone: "Direto e acessível".into(),
                key_messages: strings(&["Mudança real", "Escuta ativa"]),
                target_audience: strings(&["Eleitores locais", "Lideranças"]),
            },
            tactical_actions: vec![TacticalAction {
                title: "Reunião comunitária".into(),
                description: "Organizar encontro com moradores".into(),
                priority: "alta".into(),
                due_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap_or_default(),
                category: "Mobilização".into(),
                estimated_hours: 4,
            }],
            generated_at: Utc::now(),
        })
    }

    // ---
    // Tarefas de agente (candidato)
    // ---

    /// Grava a tarefa como `pending` e publica `AgentTaskCreated`; o processamento é assíncrono.
    pub async fn create_task(
        &self,
        tenant_id: Uuid,
        payload: CreateAgentTaskPayload,
    ) -> Result<AgentTask, AppError> {
        let task = self
            .agent_tasks
            .create(NewAgentTask {
                id: Uuid::new_v4(),
                tenant_id,
                agent_id: payload.agent_id,
                task_type: payload.task_type,
                input_data: payload.input_data,
            })
            .await?;

        let event_id = self.bus.agent_task_created().publish(AgentTaskCreated {
            task_id: task.id,
            tenant_id,
            agent_id: task.agent_id,
            task_type: task.task_type.clone(),
            input_data: task.input_data.clone(),
        });

        tracing::info!(task_id = %task.id, tenant_id = %tenant_id, event_id = %event_id, "Tarefa de agente enfileirada");
        Ok(task)
    }

    pub async fn list_tasks(&self, tenant_id: Uuid) -> Result<Vec<AgentTask>, AppError> {
        self.agent_tasks.list(tenant_id).await
    }

    pub async fn get_task(&self, tenant_id: Uuid, id: Uuid) -> Result<AgentTask, AppError> {
        self.agent_tasks
            .find(tenant_id, id)
            .await?
            .ok_or(AppError::NotFound("agent task"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        events::DeliveryPolicy,
        models::agents::AgentTaskStatus,
        storage::MemoryObjectStore,
    };
    use serde_json::json;

    struct Harness {
        svc: AgentService,
        vault: Arc<MemoryObjectStore>,
        bus: EventBus,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let vault = Arc::new(MemoryObjectStore::default());
        let bus = EventBus::new(DeliveryPolicy::default());
        let svc = AgentService::new(store.clone(), store.clone(), store, vault.clone(), bus.clone());
        Harness { svc, vault, bus }
    }

    fn new_agent(name: &str) -> CreateAgentPayload {
        CreateAgentPayload {
            name: name.into(),
            description: Some("Lê pesquisas".into()),
            agent_type: "poll_analysis".into(),
            strategy_focus: None,
            capabilities: vec!["pesquisas".into()],
        }
    }

    #[tokio::test]
    async fn update_requires_fields_and_existing_agent() {
        let h = harness();
        let agent = h.svc.create_agent(new_agent("Analista")).await.unwrap();

        let err = h.svc.update_agent(agent.id, AgentPatch::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NoFieldsToUpdate));

        let patch = AgentPatch {
            name: Some("Estrategista".into()),
            ..AgentPatch::default()
        };
        let err = h.svc.update_agent(Uuid::new_v4(), patch.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("agent")));

        let updated = h.svc.update_agent(agent.id, patch).await.unwrap();
        assert_eq!(updated.name, "Estrategista");
        assert_eq!(updated.agent_type, "poll_analysis");
    }

    #[tokio::test]
    async fn deactivated_agent_leaves_active_list() {
        let h = harness();
        let a = h.svc.create_agent(new_agent("A")).await.unwrap();
        h.svc.create_agent(new_agent("B")).await.unwrap();

        h.svc.deactivate_agent(a.id).await.unwrap();

        assert_eq!(h.svc.list_agents().await.unwrap().len(), 2);
        let active = h.svc.list_active_agents().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "B");
    }

    #[tokio::test]
    async fn knowledge_files_go_to_the_agent_folder() {
        let h = harness();
        let agent = h.svc.create_agent(new_agent("Analista")).await.unwrap();
        let files = vec![
            KnowledgeFile {
                filename: "discursos.txt".into(),
                content: STANDARD.encode("saúde e educação"),
                content_type: Some("text/plain".into()),
            },
            KnowledgeFile {
                filename: "plano.pdf".into(),
                content: STANDARD.encode("%PDF"),
                content_type: None,
            },
        ];

        let result = h.svc.upload_knowledge(agent.id, files).await.unwrap();

        assert_eq!(result.files_processed, 2);
        assert_eq!(result.message, "2 arquivos processados com sucesso");
        let keys = h.vault.keys().await;
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.starts_with(&format!("knowledge/{}/", agent.id))));
    }

    #[tokio::test]
    async fn knowledge_with_bad_base64_stores_nothing() {
        let h = harness();
        let agent = h.svc.create_agent(new_agent("Analista")).await.unwrap();
        let files = vec![
            KnowledgeFile {
                filename: "ok.txt".into(),
                content: STANDARD.encode("ok"),
                content_type: None,
            },
            KnowledgeFile {
                filename: "ruim.txt".into(),
                content: "%%%".into(),
                content_type: None,
            },
        ];

        assert!(h.svc.upload_knowledge(agent.id, files).await.is_err());
        assert!(h.vault.keys().await.is_empty());
    }

    #[tokio::test]
    async fn create_task_publishes_event() {
        let h = harness();
        let mut created = h.bus.agent_task_created().tap();
        let tenant_id = Uuid::new_v4();

        let task = h
            .svc
            .create_task(
                tenant_id,
                CreateAgentTaskPayload {
                    agent_id: Uuid::new_v4(),
                    task_type: "analysis".into(),
                    input_data: json!({ "zona": "001" }),
                },
            )
            .await
            .unwrap();

        assert_eq!(task.status, AgentTaskStatus::Pending);
        let event = created.recv().await.unwrap();
        assert_eq!(event.payload.task_id, task.id);
        assert_eq!(event.payload.tenant_id, tenant_id);

        let err = h.svc.get_task(Uuid::new_v4(), task.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
