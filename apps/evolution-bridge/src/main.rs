//! Evolution Bridge
//!
//! Serviço HTTP que expõe o repositório da assessoria (clientes, avaliações,
//! exames e protocolos) em JSON, persistindo cada alteração no SQLite local.

mod config;
mod error;
mod routes;
mod state;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::BridgeConfig;
use crate::state::AppState;

const DEFAULT_LOG_FILTER: &str = "evolution_bridge=info,evolution_core=info,tower_http=info";

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao aguardar sinal de encerramento: {}", e);
    }
    info!("Encerrando Evolution Bridge");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = BridgeConfig::from_env()?;
    init_tracing(config.log_json)?;

    info!("Iniciando Evolution Bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Banco de dados: {}", config.db.db_path);

    let state = AppState::initialise(&config).await?;
    let app = routes::router(state);

    info!("Escutando em {}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
