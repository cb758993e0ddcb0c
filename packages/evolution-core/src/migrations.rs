//! Migrações do banco de dados
//!
//! A versão aplicada fica em `PRAGMA user_version`; cada migração roda em
//! sua própria transação.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{error, info};

/// Migrações SQL, na ordem em que devem ser aplicadas
const MIGRATIONS: &[&str] = &[
    // 001_collections.sql
    r#"
    -- Documento JSON de cada coleção (clientes, avaliacoes, exames, protocolos)
    CREATE TABLE IF NOT EXISTS collections (
        name TEXT PRIMARY KEY NOT NULL,
        document TEXT NOT NULL,
        revision INTEGER NOT NULL DEFAULT 0,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    -- Conteúdo dos anexos de exames
    CREATE TABLE IF NOT EXISTS exam_files (
        id TEXT PRIMARY KEY NOT NULL,
        exam_id TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        encrypted BOOLEAN NOT NULL DEFAULT 0,
        content BLOB NOT NULL,
        nonce BLOB,
        checksum TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_exam_files_exam_id ON exam_files (exam_id);
    "#,
    // 002_master_keys.sql
    r#"
    -- Chave de dados embrulhada pela senha do administrador
    CREATE TABLE IF NOT EXISTS master_keys (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        active BOOLEAN NOT NULL DEFAULT 0,
        wrapped_key_ciphertext BLOB NOT NULL,
        wrapped_key_nonce BLOB NOT NULL,
        kdf_salt BLOB NOT NULL,
        key_version INTEGER NOT NULL
    );
    "#,
];

/// Versão do esquema após todas as migrações
pub fn latest_version() -> i64 {
    MIGRATIONS.len() as i64
}

/// Executa todas as migrações pendentes no banco de dados
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Aplicando migrações de banco de dados...");

    let version: i64 = match sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
    {
        Ok(v) => v,
        Err(e) => {
            // primeira execução
            error!("Erro ao obter versão do banco: {}", e);
            0
        }
    };

    info!("Versão atual do banco: {}", version);

    for (i, migration_sql) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as i64;
        if migration_version <= version {
            continue;
        }

        info!("Aplicando migração {}...", migration_version);

        let mut transaction = pool.begin().await.with_context(|| {
            format!("Falha ao iniciar transação para migração {}", migration_version)
        })?;

        sqlx::query(migration_sql)
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Falha ao executar migração {}", migration_version))?;

        sqlx::query(&format!("PRAGMA user_version = {}", migration_version))
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Falha ao atualizar versão para {}", migration_version))?;

        transaction.commit().await.with_context(|| {
            format!("Falha ao confirmar transação para migração {}", migration_version)
        })?;

        info!("Migração {} aplicada com sucesso", migration_version);
    }

    info!("Migrações concluídas. Versão atual: {}", latest_version());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteConnectOptions;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_migrations() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test_migrations.db");

        let conn_options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(conn_options).await?;

        run_migrations(&pool).await?;
        // reaplicar não faz nada
        run_migrations(&pool).await?;

        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await?;
        assert_eq!(version, latest_version());

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(&pool)
        .await?;

        assert!(tables.contains(&"collections".to_string()));
        assert!(tables.contains(&"exam_files".to_string()));
        assert!(tables.contains(&"master_keys".to_string()));

        Ok(())
    }
}
