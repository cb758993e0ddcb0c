//! Evolution Core - Biblioteca de domínio para acompanhamento de clientes
//!
//! Esta biblioteca fornece:
//! - Modelos de clientes, avaliações físicas, exames e protocolos
//! - Repositório genérico em memória com busca e paginação
//! - Cálculos de IMC e classificações
//! - Comparativos entre avaliações e entre exames
//! - Séries temporais para gráficos de evolução
//! - Persistência em SQLite com anexos criptografados

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod attachments;
pub mod clinic;
pub mod comparison;
pub mod crypto;
pub mod demo;
pub mod error;
pub mod metrics;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod store;
pub mod timeseries;

pub use clinic::{Clinic, ExamFilter};
pub use error::{DbError, DomainError};
pub use repository::{Entity, ListQuery, Page, Repository};
pub use store::Store;

/// Configuração da conexão com o banco de dados
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Caminho para o arquivo SQLite
    pub db_path: String,
    /// Senha do administrador; protege a chave de dados dos anexos.
    /// Vazia desativa a criptografia dos anexos.
    pub key_phrase: String,
    /// Número máximo de conexões no pool
    pub max_connections: u32,
    /// Nível de trace do SQL (0-3)
    pub trace_level: u8,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_path: "data/evolution.db".to_string(),
            key_phrase: "".to_string(),
            max_connections: 5,
            trace_level: 0,
        }
    }
}

/// Inicializa o pool SQLite e aplica as migrações pendentes
pub async fn init_db_pool(config: &DbConfig) -> Result<SqlitePool> {
    let db_path = Path::new(&config.db_path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .context("Falha ao criar diretório para banco de dados")?;
        }
    }

    let mut connection_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5))
        .pragma("synchronous", "NORMAL");

    // SQL só aparece no log com trace_level > 0
    if config.trace_level == 0 {
        connection_options = sqlx::ConnectOptions::disable_statement_logging(connection_options);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connection_options)
        .await
        .context("Falha ao conectar ao banco de dados SQLite")?;

    migrations::run_migrations(&pool)
        .await
        .context("Falha ao aplicar migrações")?;

    info!("Banco de dados inicializado com sucesso: {}", config.db_path);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_db_connection() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("nested").join("test.db");

        let config = DbConfig {
            db_path: db_path.to_string_lossy().to_string(),
            key_phrase: "test_password".to_string(),
            max_connections: 2,
            trace_level: 3,
        };

        let pool = init_db_pool(&config).await?;

        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await?;
        assert_eq!(version, migrations::latest_version());
        assert!(db_path.exists());

        let collections: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections")
            .fetch_one(&pool)
            .await?;
        assert_eq!(collections, 0);

        Ok(())
    }
}
