// src/db/memory.rs

use std::{cmp::Reverse, collections::HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        AgentStore, AgentTaskStore, DocumentStore, ElectoralStore, InsightStore, ReceiptStore,
        TaskStore, TenantStore, UserStore,
    },
    models::{
        agents::{Agent, AgentPatch, AgentTask, AgentTaskStatus, NewAgent, NewAgentTask},
        auth::{NewUser, User},
        electoral::{ElectionRow, IbgeRow, PollRow, VoteStats, ZoneRow},
        insights::{Insight, NewInsight},
        tasks::{NewTask, Task, TaskPatch, TaskStatus},
        tenancy::{GovernmentPlan, NewGovernmentPlan, NewTenant, Tenant},
        vault::{Document, NewDocument},
    },
};

// O evento de origem só importa no Postgres; aqui basta o tenant
struct Imported<T> {
    tenant_id: Uuid,
    row: T,
}

#[derive(Default)]
struct Tables {
    tenants: Vec<Tenant>,
    users: Vec<User>,
    plans: Vec<GovernmentPlan>,
    agents: Vec<Agent>,
    agent_tasks: Vec<AgentTask>,
    insights: Vec<Insight>,
    tasks: Vec<Task>,
    documents: Vec<Document>,
    // Ordem de inserção = ordem de chegada ("mais recente" = mais ao fim)
    elections: Vec<Imported<ElectionRow>>,
    ibge: Vec<Imported<IbgeRow>>,
    polls: Vec<Imported<PollRow>>,
    receipts: HashSet<(String, Uuid)>,
}

/// Implementação em memória de todos os repositórios.
/// Mesmas regras de escopo por tenant da versão Postgres; usada nos testes
/// e com `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Mais novos primeiro; empates ficam com o inserido por último na frente.
fn newest_first<T: Clone>(items: impl DoubleEndedIterator<Item = T>, at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by_key(|item| Reverse(at(item)));
    out
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;

        Ok(tables.users.iter().find(|u| u.email == email).map(|u| {
            let mut user = u.clone();
            user.subdomain = user
                .tenant_id
                .and_then(|tid| tables.tenants.iter().find(|t| t.id == tid))
                .map(|t| t.subdomain.clone());
            user
        }))
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        insert_user(&mut tables, user)
    }
}

fn insert_user(tables: &mut Tables, user: NewUser) -> Result<User, AppError> {
    if tables.users.iter().any(|u| u.email == user.email) {
        return Err(AppError::EmailAlreadyExists(user.email));
    }

    let created = User {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        tenant_id: user.tenant_id,
        is_active: true,
        password_hash: user.password_hash,
        created_at: Utc::now(),
        subdomain: None,
    };
    tables.users.push(created.clone());
    Ok(created)
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, AppError> {
        Ok(self.tables.read().await.tenants.iter().any(|t| t.subdomain == subdomain))
    }

    async fn create(
        &self,
        tenant: NewTenant,
        plan: Option<NewGovernmentPlan>,
        owner: Option<NewUser>,
    ) -> Result<Tenant, AppError> {
        // O write lock faz o papel da transação: valida tudo antes de gravar
        let mut tables = self.tables.write().await;

        if tables.tenants.iter().any(|t| t.subdomain == tenant.subdomain) {
            return Err(AppError::SubdomainAlreadyExists(tenant.subdomain));
        }
        if let Some(owner) = &owner {
            if tables.users.iter().any(|u| u.email == owner.email) {
                return Err(AppError::EmailAlreadyExists(owner.email.clone()));
            }
        }

        let now = Utc::now();
        let created = Tenant {
            id: tenant.id,
            subdomain: tenant.subdomain,
            name: tenant.name,
            candidate_name: tenant.candidate_name,
            position: tenant.position,
            party: tenant.party,
            election_year: tenant.election_year,
            city: tenant.city,
            state: tenant.state,
            is_active: true,
            assigned_agent_id: tenant.assigned_agent_id,
            created_at: now,
            updated_at: now,
        };
        tables.tenants.push(created.clone());

        if let Some(plan) = plan {
            tables.plans.push(GovernmentPlan {
                id: Uuid::new_v4(),
                tenant_id: created.id,
                filename: plan.filename,
                file_path: plan.file_path,
                strategic_axes: plan.strategic_axes,
                created_at: now,
            });
        }

        if let Some(owner) = owner {
            insert_user(&mut tables, owner)?;
        }

        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.tenants.iter().cloned(), |t| t.created_at))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        Ok(self.tables.read().await.tenants.iter().find(|t| t.id == id).cloned())
    }

    async fn find_active_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .tenants
            .iter()
            .find(|t| t.subdomain == subdomain && t.is_active)
            .cloned())
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.tenants.iter_mut().find(|t| t.id == id) {
            Some(tenant) => {
                tenant.is_active = false;
                tenant.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl AgentStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Agent>, AppError> {
        let mut agents = self.tables.read().await.agents.clone();
        agents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(agents)
    }

    async fn list_active(&self) -> Result<Vec<Agent>, AppError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.agents.iter().filter(|a| a.is_active).cloned(),
            |a| a.created_at,
        ))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Agent>, AppError> {
        Ok(self.tables.read().await.agents.iter().find(|a| a.id == id).cloned())
    }

    async fn create(&self, agent: NewAgent) -> Result<Agent, AppError> {
        let now = Utc::now();
        let created = Agent {
            id: agent.id,
            name: agent.name,
            description: agent.description,
            agent_type: agent.agent_type,
            strategy_focus: agent.strategy_focus,
            capabilities: agent.capabilities,
            status: "active".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.agents.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &AgentPatch) -> Result<Option<Agent>, AppError> {
        if patch.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        let mut tables = self.tables.write().await;
        let Some(agent) = tables.agents.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };

        if let Some(name) = &patch.name {
            agent.name = name.clone();
        }
        if let Some(description) = &patch.description {
            agent.description = Some(description.clone());
        }
        if let Some(agent_type) = &patch.agent_type {
            agent.agent_type = agent_type.clone();
        }
        if let Some(focus) = &patch.strategy_focus {
            agent.strategy_focus = Some(focus.clone());
        }
        if let Some(capabilities) = &patch.capabilities {
            agent.capabilities = capabilities.clone();
        }
        if let Some(status) = &patch.status {
            agent.status = status.clone();
        }
        agent.updated_at = Utc::now();

        Ok(Some(agent.clone()))
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.agents.iter_mut().find(|a| a.id == id) {
            Some(agent) => {
                agent.is_active = false;
                agent.status = "inactive".to_string();
                agent.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl AgentTaskStore for MemoryStore {
    async fn create(&self, task: NewAgentTask) -> Result<AgentTask, AppError> {
        let created = AgentTask {
            id: task.id,
            tenant_id: task.tenant_id,
            agent_id: task.agent_id,
            task_type: task.task_type,
            input_data: task.input_data,
            status: AgentTaskStatus::Pending,
            output_data: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.tables.write().await.agent_tasks.push(created.clone());
        Ok(created)
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<AgentTask>, AppError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.agent_tasks.iter().filter(|t| t.tenant_id == tenant_id).cloned(),
            |t| t.created_at,
        ))
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<AgentTask>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .agent_tasks
            .iter()
            .find(|t| t.tenant_id == tenant_id && t.id == id)
            .cloned())
    }

    async fn mark_processing(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let task = tables.agent_tasks.iter_mut().find(|t| {
            t.tenant_id == tenant_id && t.id == id && t.status == AgentTaskStatus::Pending
        });

        Ok(match task {
            Some(task) => {
                task.status = AgentTaskStatus::Processing;
                task.started_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }

    async fn mark_completed(&self, tenant_id: Uuid, id: Uuid, output: &Value) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let task = tables.agent_tasks.iter_mut().find(|t| {
            t.tenant_id == tenant_id && t.id == id && t.status == AgentTaskStatus::Processing
        });

        Ok(match task {
            Some(task) => {
                task.status = AgentTaskStatus::Completed;
                task.completed_at = Some(Utc::now());
                task.output_data = Some(output.clone());
                true
            }
            None => false,
        })
    }

    async fn mark_failed(&self, tenant_id: Uuid, id: Uuid, error: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let task = tables.agent_tasks.iter_mut().find(|t| {
            t.tenant_id == tenant_id && t.id == id && !t.status.is_terminal()
        });

        Ok(match task {
            Some(task) => {
                task.status = AgentTaskStatus::Failed;
                task.completed_at = Some(Utc::now());
                task.error = Some(error.to_string());
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl InsightStore for MemoryStore {
    async fn create(&self, insight: NewInsight) -> Result<Insight, AppError> {
        let created = Insight {
            id: insight.id,
            tenant_id: insight.tenant_id,
            title: insight.title,
            description: insight.description,
            insight_type: insight.insight_type,
            data: insight.data,
            priority: insight.priority,
            is_read: false,
            created_at: Utc::now(),
        };
        self.tables.write().await.insights.push(created.clone());
        Ok(created)
    }

    async fn list(&self, tenant_id: Uuid, limit: Option<i64>) -> Result<Vec<Insight>, AppError> {
        let tables = self.tables.read().await;
        let mut insights = newest_first(
            tables.insights.iter().filter(|i| i.tenant_id == tenant_id).cloned(),
            |i| i.created_at,
        );
        if let Some(limit) = limit {
            insights.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(insights)
    }

    async fn count_unread(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        let count = tables
            .insights
            .iter()
            .filter(|i| i.tenant_id == tenant_id && !i.is_read)
            .count();
        Ok(count as i64)
    }

    async fn mark_read(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Insight>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .insights
            .iter_mut()
            .find(|i| i.tenant_id == tenant_id && i.id == id)
            .map(|insight| {
                insight.is_read = true;
                insight.clone()
            }))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        let mut tasks = newest_first(
            tables.tasks.iter().filter(|t| t.tenant_id == tenant_id).cloned(),
            |t| t.created_at,
        );
        // Estável: empates de prioridade e prazo mantêm "recentes primeiro"
        tasks.sort_by_key(|t| (t.priority.rank(), t.due_date.is_none(), t.due_date));
        Ok(tasks)
    }

    async fn create(&self, task: NewTask) -> Result<Task, AppError> {
        let created = Task {
            id: task.id,
            tenant_id: task.tenant_id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: TaskStatus::Pending,
            due_date: task.due_date,
            assigned_to: task.assigned_to,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.tables.write().await.tasks.push(created.clone());
        Ok(created)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, patch: &TaskPatch) -> Result<Option<Task>, AppError> {
        if patch.is_empty() {
            return Err(AppError::NoFieldsToUpdate);
        }

        let mut tables = self.tables.write().await;
        let Some(task) = tables
            .tasks
            .iter_mut()
            .find(|t| t.tenant_id == tenant_id && t.id == id)
        else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
            if status == TaskStatus::Completed {
                task.completed_at = Some(Utc::now());
            }
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(assigned_to) = &patch.assigned_to {
            task.assigned_to = Some(assigned_to.clone());
        }

        Ok(Some(task.clone()))
    }

    async fn upcoming_pending(&self, tenant_id: Uuid, limit: i64) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.status == TaskStatus::Pending)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date, t.created_at));
        tasks.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(tasks)
    }

    async fn count_pending(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        let count = tables
            .tasks
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.status == TaskStatus::Pending)
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, tenant_id: Uuid) -> Result<Vec<Document>, AppError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.documents.iter().filter(|d| d.tenant_id == tenant_id).cloned(),
            |d| d.uploaded_at,
        ))
    }

    async fn create(&self, document: NewDocument) -> Result<Document, AppError> {
        let created = Document {
            id: document.id,
            tenant_id: document.tenant_id,
            name: document.name,
            content_type: document.content_type,
            size_bytes: document.size_bytes,
            file_path: document.file_path,
            tags: document.tags,
            uploaded_by: document.uploaded_by,
            uploaded_at: Utc::now(),
        };
        self.tables.write().await.documents.push(created.clone());
        Ok(created)
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .documents
            .iter()
            .find(|d| d.tenant_id == tenant_id && d.id == id)
            .cloned())
    }
}

#[async_trait]
impl ElectoralStore for MemoryStore {
    async fn insert_election(&self, tenant_id: Uuid, _source_event_id: Uuid, row: &ElectionRow) -> Result<(), AppError> {
        self.tables.write().await.elections.push(Imported {
            tenant_id,
            row: row.clone(),
        });
        Ok(())
    }

    async fn insert_ibge(&self, tenant_id: Uuid, _source_event_id: Uuid, row: &IbgeRow) -> Result<(), AppError> {
        self.tables.write().await.ibge.push(Imported {
            tenant_id,
            row: row.clone(),
        });
        Ok(())
    }

    async fn insert_poll(&self, tenant_id: Uuid, _source_event_id: Uuid, row: &PollRow) -> Result<(), AppError> {
        self.tables.write().await.polls.push(Imported {
            tenant_id,
            row: row.clone(),
        });
        Ok(())
    }

    async fn vote_stats(&self, tenant_id: Uuid) -> Result<VoteStats, AppError> {
        let tables = self.tables.read().await;
        let rows: Vec<&ElectionRow> = tables
            .elections
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .map(|e| &e.row)
            .collect();

        if rows.is_empty() {
            return Ok(VoteStats::default());
        }

        Ok(VoteStats {
            total_votes: rows.iter().map(|r| r.votes).sum(),
            vote_percentage: rows.iter().map(|r| r.percentage).sum::<f64>() / rows.len() as f64,
        })
    }

    async fn poll_rating(&self, tenant_id: Uuid, last_n: i64) -> Result<f64, AppError> {
        let tables = self.tables.read().await;
        let mut polls: Vec<&PollRow> = tables
            .polls
            .iter()
            .rev()
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| &p.row)
            .collect();
        polls.sort_by_key(|p| Reverse(p.date_conducted));
        polls.truncate(usize::try_from(last_n).unwrap_or(0));

        if polls.is_empty() {
            return Ok(0.0);
        }
        Ok(polls.iter().map(|p| p.intention_percentage).sum::<f64>() / polls.len() as f64)
    }

    async fn zones(&self, tenant_id: Uuid) -> Result<Vec<ZoneRow>, AppError> {
        let tables = self.tables.read().await;

        let mut zones: Vec<ZoneRow> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();

        for e in tables.elections.iter().filter(|e| e.tenant_id == tenant_id) {
            match zones.iter().position(|z| z.zone == e.row.zone) {
                Some(idx) => {
                    zones[idx].total_votes += e.row.votes;
                    zones[idx].avg_percentage += e.row.percentage;
                    counts[idx] += 1;
                }
                None => {
                    zones.push(ZoneRow {
                        zone: e.row.zone.clone(),
                        total_votes: e.row.votes,
                        avg_percentage: e.row.percentage,
                        ..ZoneRow::default()
                    });
                    counts.push(1);
                }
            }
        }

        for (zone, count) in zones.iter_mut().zip(counts) {
            zone.avg_percentage /= count as f64;

            // Linha de IBGE mais recente da zona
            let latest = tables
                .ibge
                .iter()
                .rev()
                .find(|i| i.tenant_id == tenant_id && i.row.zone == zone.zone);

            if let Some(i) = latest {
                let r = &i.row;
                zone.population = r.population;
                zone.age_0_17 = r.age_0_17;
                zone.age_18_24 = r.age_18_24;
                zone.age_25_34 = r.age_25_34;
                zone.age_35_44 = r.age_35_44;
                zone.age_45_54 = r.age_45_54;
                zone.age_55_64 = r.age_55_64;
                zone.age_65_plus = r.age_65_plus;
                zone.income_0_2 = r.income_0_2;
                zone.income_2_5 = r.income_2_5;
                zone.income_5_10 = r.income_5_10;
                zone.income_10_plus = r.income_10_plus;
                zone.education_fundamental = r.education_fundamental;
                zone.education_medio = r.education_medio;
                zone.education_superior = r.education_superior;
            }
        }

        zones.sort_by(|a, b| a.zone.cmp(&b.zone));
        Ok(zones)
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn claim(&self, consumer: &str, event_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .tables
            .write()
            .await
            .receipts
            .insert((consumer.to_string(), event_id)))
    }
}
