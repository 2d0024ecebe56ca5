// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{fixtures::Fixtures, MemoryStore, Repositories},
    events::{DeliveryPolicy, EventBus},
    services::{
        agent_service::AgentService, auth::AuthService, classifier::AgentClassifier,
        dashboard_service::DashboardService, ingest_service::IngestService,
        task_service::TaskService, tenancy_service::TenantService, vault_service::VaultService,
        workers,
    },
    storage::Buckets,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("STORE_BACKEND deve ser 'postgres' ou 'memory', recebido '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Tudo o que vem do ambiente (e do `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub fixtures_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bind_addr: String,
    pub storage_dir: PathBuf,
    pub agent_latency: Duration,
    pub agent_timeout: Duration,
    pub delivery: DeliveryPolicy,
    pub db_max_connections: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("valor inválido para {} ('{}'): {}", key, raw, e)),
        None => Ok(default),
    }
}

// Dez anos: acima disso o token não expira na prática
const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

fn positive_ttl(hours: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_TTL_HOURS).contains(&hours) {
        anyhow::bail!("JWT_TTL_HOURS deve estar entre 1 e {} (recebido {})", MAX_TTL_HOURS, hours);
    }
    Ok(hours)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Sem .env é normal (produção usa variáveis reais)
        dotenvy::dotenv().ok();

        let backend = match optional("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Postgres,
        };

        let database_url = optional("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida quando STORE_BACKEND=postgres");
        }

        let jwt_secret = optional("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bootstrap_admin = match (optional("BOOTSTRAP_ADMIN_EMAIL"), optional("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: optional("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| "Administrador".to_string()),
            }),
            (None, None) => None,
            _ => anyhow::bail!("BOOTSTRAP_ADMIN_EMAIL e BOOTSTRAP_ADMIN_PASSWORD devem ser definidos juntos"),
        };

        let max_deliveries: u32 = parsed_or("EVENT_MAX_DELIVERIES", 3)?;
        if max_deliveries == 0 {
            anyhow::bail!("EVENT_MAX_DELIVERIES deve ser pelo menos 1");
        }

        Ok(Self {
            backend,
            database_url,
            fixtures_path: optional("FIXTURES_PATH").map(PathBuf::from),
            jwt_secret,
            jwt_ttl_hours: positive_ttl(parsed_or("JWT_TTL_HOURS", 168)?)?,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            storage_dir: optional("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./storage")),
            agent_latency: Duration::from_millis(parsed_or("AGENT_LATENCY_MS", 2000)?),
            agent_timeout: Duration::from_secs(parsed_or("AGENT_TIMEOUT_SECS", 30)?),
            delivery: DeliveryPolicy {
                max_deliveries,
                backoff: Duration::from_millis(parsed_or("EVENT_RETRY_BACKOFF_MS", 500)?),
            },
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 5)?,
            bootstrap_admin,
        })
    }
}

pub async fn connect_pool(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL deve ser definida")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await
        .context("falha ao conectar no Postgres")?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}

/// Repositórios conforme o backend escolhido; no backend em memória carrega as fixtures.
pub async fn build_repositories(config: &Config) -> anyhow::Result<(Repositories, Option<PgPool>)> {
    match config.backend {
        StoreBackend::Postgres => {
            let pool = connect_pool(config).await?;
            Ok((Repositories::postgres(pool.clone()), Some(pool)))
        }
        StoreBackend::Memory => {
            let repos = Repositories::in_memory(Arc::new(MemoryStore::new()));
            if let Some(path) = &config.fixtures_path {
                Fixtures::from_file(path)?.seed(&repos).await?;
            }
            tracing::warn!("⚠️ Usando armazenamento em memória: os dados somem ao reiniciar");
            Ok((repos, None))
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub i18n_store: Arc<I18nStore>,
    pub bus: EventBus,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub agent_service: AgentService,
    pub task_service: TaskService,
    pub vault_service: VaultService,
    pub dashboard_service: DashboardService,
    pub ingest_service: IngestService,
}

impl AppState {
    /// Monta o gráfico de dependências e liga os consumidores de eventos.
    pub fn assemble(
        repos: &Repositories,
        buckets: &Buckets,
        bus: EventBus,
        classifier: Arc<dyn AgentClassifier>,
        jwt_secret: String,
        jwt_ttl_hours: i64,
        agent_timeout: Duration,
    ) -> Self {
        workers::register(&bus, repos, buckets, classifier, agent_timeout);

        Self {
            i18n_store: Arc::new(I18nStore::default()),
            auth_service: AuthService::new(repos.users.clone(), repos.tenants.clone(), jwt_secret, jwt_ttl_hours),
            tenant_service: TenantService::new(repos.tenants.clone(), buckets.vault.clone()),
            agent_service: AgentService::new(
                repos.agents.clone(),
                repos.agent_tasks.clone(),
                repos.tenants.clone(),
                buckets.vault.clone(),
                bus.clone(),
            ),
            task_service: TaskService::new(repos.tasks.clone(), repos.insights.clone()),
            vault_service: VaultService::new(repos.documents.clone(), buckets.vault.clone()),
            dashboard_service: DashboardService::new(
                repos.electoral.clone(),
                repos.insights.clone(),
                repos.tasks.clone(),
            ),
            ingest_service: IngestService::new(buckets.uploads.clone(), bus.clone()),
            bus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" postgres ".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn parsed_or_falls_back_to_default() {
        assert_eq!(parsed_or::<u32>("PRISMA_TESTE_VARIAVEL_AUSENTE", 7).unwrap(), 7);
    }

    #[test]
    fn token_ttl_must_be_positive() {
        assert_eq!(positive_ttl(168).unwrap(), 168);
        assert!(positive_ttl(0).is_err());
        assert!(positive_ttl(-1).is_err());
        assert!(positive_ttl(i64::MAX).is_err());
    }
}
