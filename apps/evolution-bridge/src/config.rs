//! Configuração do serviço a partir de variáveis de ambiente

use std::net::SocketAddr;

use anyhow::{Context, Result};
use evolution_core::DbConfig;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub addr: SocketAddr,
    pub db: DbConfig,
    /// Carrega os dados de demonstração quando o banco está vazio
    pub seed: bool,
    /// Logs em JSON
    pub log_json: bool,
}

impl BridgeConfig {
    /// Lê a configuração do ambiente:
    /// - `EVOLUTION_ADDR` (padrão `0.0.0.0:8080`)
    /// - `EVOLUTION_DB_PATH` (padrão `data/evolution.db`)
    /// - `EVOLUTION_KEY_PHRASE` (sem ela os anexos não são criptografados)
    /// - `EVOLUTION_MAX_CONNECTIONS`
    /// - `EVOLUTION_SEED`, `EVOLUTION_LOG_JSON` (`1` ou `true`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr_text = lookup("EVOLUTION_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_text
            .parse()
            .with_context(|| format!("EVOLUTION_ADDR inválido: {}", addr_text))?;

        let mut db = DbConfig::default();
        if let Some(path) = lookup("EVOLUTION_DB_PATH") {
            db.db_path = path;
        }
        db.key_phrase = lookup("EVOLUTION_KEY_PHRASE").unwrap_or_default();
        if let Some(max) = lookup("EVOLUTION_MAX_CONNECTIONS") {
            db.max_connections = max
                .parse()
                .with_context(|| format!("EVOLUTION_MAX_CONNECTIONS inválido: {}", max))?;
        }

        let flag = |name: &str| {
            lookup(name)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        Ok(Self {
            addr,
            db,
            seed: flag("EVOLUTION_SEED"),
            log_json: flag("EVOLUTION_LOG_JSON"),
        })
    }
}
