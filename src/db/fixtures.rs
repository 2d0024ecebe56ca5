// src/db/fixtures.rs

use std::{collections::HashMap, path::Path};

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    db::Repositories,
    models::{
        agents::NewAgent,
        auth::{NewUser, Role},
        electoral::DataType,
        insights::NewInsight,
        tasks::{NewTask, Priority, TaskPatch, TaskStatus},
        tenancy::NewTenant,
    },
    services::{
        auth::hash_password,
        csv_worker::{data_lines, parse_line, ParsedRow},
    },
};

/// Dados de demonstração carregados no backend em memória.
/// Tudo que referencia um tenant usa o subdomínio.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixtures {
    pub agents: Vec<AgentFixture>,
    pub tenants: Vec<TenantFixture>,
    pub users: Vec<UserFixture>,
    pub tasks: Vec<TaskFixture>,
    pub insights: Vec<InsightFixture>,
    pub datasets: Vec<DatasetFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentFixture {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: String,
    pub strategy_focus: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantFixture {
    pub id: Option<Uuid>,
    pub subdomain: String,
    pub name: String,
    pub candidate_name: String,
    pub position: String,
    pub party: Option<String>,
    pub election_year: i32,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFixture {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub tenant: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFixture {
    pub tenant: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub status: Option<TaskStatus>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightFixture {
    pub tenant: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub insight_type: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub data: Value,
}

/// Um CSV completo (com cabeçalho), no mesmo formato aceito pela ingestão.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetFixture {
    pub tenant: String,
    pub data_type: DataType,
    pub csv: String,
}

impl Fixtures {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("não foi possível ler as fixtures em {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("fixtures inválidas em {}", path.display()))
    }

    /// Grava tudo pelos próprios repositórios (mesmas regras da API).
    pub async fn seed(self, repos: &Repositories) -> anyhow::Result<()> {
        for agent in self.agents {
            repos
                .agents
                .create(NewAgent {
                    id: agent.id.unwrap_or_else(Uuid::new_v4),
                    name: agent.name,
                    description: agent.description,
                    agent_type: agent.agent_type,
                    strategy_focus: agent.strategy_focus,
                    capabilities: agent.capabilities,
                })
                .await?;
        }

        let mut tenant_ids: HashMap<String, Uuid> = HashMap::new();
        for tenant in self.tenants {
            let created = repos
                .tenants
                .create(
                    NewTenant {
                        id: tenant.id.unwrap_or_else(Uuid::new_v4),
                        subdomain: tenant.subdomain,
                        name: tenant.name,
                        candidate_name: tenant.candidate_name,
                        position: tenant.position,
                        party: tenant.party,
                        election_year: tenant.election_year,
                        city: tenant.city,
                        state: tenant.state,
                        assigned_agent_id: None,
                    },
                    None,
                    None,
                )
                .await?;
            tenant_ids.insert(created.subdomain.clone(), created.id);
        }

        let tenant_of = |subdomain: &str| -> anyhow::Result<Uuid> {
            tenant_ids
                .get(subdomain)
                .copied()
                .with_context(|| format!("fixture referencia tenant desconhecido '{}'", subdomain))
        };

        for user in self.users {
            let tenant_id = user.tenant.as_deref().map(tenant_of).transpose()?;
            let password_hash = hash_password(&user.password).await?;
            repos
                .users
                .create(NewUser {
                    id: Uuid::new_v4(),
                    email: user.email,
                    name: user.name,
                    role: user.role,
                    tenant_id,
                    password_hash,
                })
                .await?;
        }

        for task in self.tasks {
            let tenant_id = tenant_of(&task.tenant)?;
            let created = repos
                .tasks
                .create(NewTask {
                    id: Uuid::new_v4(),
                    tenant_id,
                    title: task.title,
                    description: task.description,
                    priority: task.priority,
                    due_date: task.due_date,
                    assigned_to: task.assigned_to,
                })
                .await?;

            if let Some(status) = task.status.filter(|s| *s != TaskStatus::Pending) {
                let patch = TaskPatch {
                    status: Some(status),
                    ..TaskPatch::default()
                };
                repos.tasks.update(tenant_id, created.id, &patch).await?;
            }
        }

        for insight in self.insights {
            repos
                .insights
                .create(NewInsight {
                    id: Uuid::new_v4(),
                    tenant_id: tenant_of(&insight.tenant)?,
                    title: insight.title,
                    description: insight.description,
                    insight_type: insight.insight_type,
                    data: insight.data,
                    priority: insight.priority,
                })
                .await?;
        }

        for dataset in self.datasets {
            let tenant_id = tenant_of(&dataset.tenant)?;
            let source = Uuid::new_v4();

            for line in data_lines(&dataset.csv) {
                let row = parse_line(dataset.data_type, line).map_err(|reason| {
                    anyhow::anyhow!("linha inválida nas fixtures ({}): {}", line, reason)
                })?;
                match row {
                    ParsedRow::Election(r) => repos.electoral.insert_election(tenant_id, source, &r).await?,
                    ParsedRow::Ibge(r) => repos.electoral.insert_ibge(tenant_id, source, &r).await?,
                    ParsedRow::Poll(r) => repos.electoral.insert_poll(tenant_id, source, &r).await?,
                }
            }
        }

        tracing::info!("🌱 Fixtures carregadas no armazenamento em memória");
        Ok(())
    }
}
