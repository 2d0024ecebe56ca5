//src/main.rs

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod events;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod storage;

use crate::{
    config::{build_repositories, AppState, Config},
    events::EventBus,
    services::classifier::MockClassifier,
    storage::Buckets,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let (repos, pool) = build_repositories(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    if let Some(pool) = &pool {
        sqlx::migrate!()
            .run(pool)
            .await
            .context("falha ao rodar as migrações do banco de dados")?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let buckets = Buckets::local(&config.storage_dir);
    let bus = EventBus::new(config.delivery);
    let classifier = Arc::new(MockClassifier::new(config.agent_latency));

    let app_state = AppState::assemble(
        &repos,
        &buckets,
        bus.clone(),
        classifier,
        config.jwt_secret.clone(),
        config.jwt_ttl_hours,
        config.agent_timeout,
    );

    if let Some(admin) = &config.bootstrap_admin {
        app_state
            .auth_service
            .bootstrap_admin(&admin.email, &admin.password, &admin.name)
            .await
            .context("falha ao criar o admin inicial")?;
    }

    let app = routes::router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("erro no servidor Axum")?;

    // Drena os consumidores antes de sair
    bus.shutdown().await;
    tracing::info!("👋 Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("falha ao escutar Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("falha ao escutar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("🛑 Sinal de desligamento recebido");
}
