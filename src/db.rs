pub mod agent_repo;
pub mod agent_task_repo;
pub mod electoral_repo;
pub mod fixtures;
pub mod insight_repo;
pub mod memory;
pub mod receipt_repo;
pub mod task_repo;
pub mod tenancy_repo;
pub mod user_repo;
pub mod vault_repo;

use std::sync::Arc;

use sqlx::PgPool;

pub use agent_repo::{AgentStore, PgAgentRepository};
pub use agent_task_repo::{AgentTaskStore, PgAgentTaskRepository};
pub use electoral_repo::{ElectoralStore, PgElectoralRepository};
pub use insight_repo::{InsightStore, PgInsightRepository};
pub use memory::MemoryStore;
pub use receipt_repo::{PgReceiptRepository, ReceiptStore};
pub use task_repo::{PgTaskRepository, TaskStore};
pub use tenancy_repo::{PgTenantRepository, TenantStore};
pub use user_repo::{PgUserRepository, UserStore};
pub use vault_repo::{DocumentStore, PgDocumentRepository};

/// Todos os repositórios, atrás de traits: Postgres em produção, memória nos testes.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub tenants: Arc<dyn TenantStore>,
    pub agents: Arc<dyn AgentStore>,
    pub agent_tasks: Arc<dyn AgentTaskStore>,
    pub insights: Arc<dyn InsightStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub electoral: Arc<dyn ElectoralStore>,
    pub receipts: Arc<dyn ReceiptStore>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tenants: Arc::new(PgTenantRepository::new(pool.clone())),
            agents: Arc::new(PgAgentRepository::new(pool.clone())),
            agent_tasks: Arc::new(PgAgentTaskRepository::new(pool.clone())),
            insights: Arc::new(PgInsightRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool.clone())),
            documents: Arc::new(PgDocumentRepository::new(pool.clone())),
            electoral: Arc::new(PgElectoralRepository::new(pool.clone())),
            receipts: Arc::new(PgReceiptRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            tenants: store.clone(),
            agents: store.clone(),
            agent_tasks: store.clone(),
            insights: store.clone(),
            tasks: store.clone(),
            documents: store.clone(),
            electoral: store.clone(),
            receipts: store,
        }
    }
}
