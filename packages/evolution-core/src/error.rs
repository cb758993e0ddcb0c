//! Definições de erro para a biblioteca evolution-core
//!
//! `DomainError` cobre as validações síncronas do domínio (repositório,
//! cálculos e comparativos). `DbError` cobre a camada de persistência.

use thiserror::Error;
use uuid::Uuid;

/// Erros de validação do domínio, devolvidos diretamente ao chamador
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity} não encontrado(a): {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Medida inválida: {0}")]
    InvalidMeasurement(String),

    #[error("Comparação inválida: {0}")]
    InvalidComparison(String),

    #[error("Registros incompatíveis: {0}")]
    IncompatibleRecords(String),

    #[error("Identidade duplicada: {0}")]
    DuplicateIdentity(String),

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Conflito de versão em {id}: esperada {expected}, atual {actual}")]
    VersionConflict { id: Uuid, expected: u64, actual: u64 },

    #[error("Paginação inválida: {0}")]
    InvalidPagination(String),

    #[error("Atualização parcial inválida: {0}")]
    InvalidPatch(String),

    #[error("Erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        DomainError::NotFound { entity, id }
    }
}

/// Erros específicos para operações de banco de dados
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Erro de conexão com banco de dados: {0}")]
    ConnectionError(String),

    #[error("Erro de migração: {0}")]
    MigrationError(String),

    #[error("Erro de consulta: {0}")]
    QueryError(String),

    #[error("Entidade não encontrada: {0}")]
    NotFound(String),

    #[error("Violação de restrição: {0}")]
    ConstraintViolation(String),

    #[error("Erro de criptografia: {0}")]
    CryptoError(String),

    #[error("Erro interno: {0}")]
    InternalError(String),
}

/// Conversão de erros específicos do SQLx para nossos tipos de erro
impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DbError::NotFound("Registro não encontrado".to_string()),
            sqlx::Error::Database(dbe) => {
                if let Some(code) = dbe.code() {
                    if code.as_ref() == "2067" || code.as_ref() == "1555" {
                        return DbError::ConstraintViolation(dbe.message().to_string());
                    }
                }
                DbError::QueryError(dbe.message().to_string())
            }
            sqlx::Error::ColumnNotFound(col) => {
                DbError::QueryError(format!("Coluna não encontrada: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::QueryError(format!("Erro ao decodificar coluna {}: {}", index, source))
            }
            sqlx::Error::Io(io_err) => DbError::ConnectionError(io_err.to_string()),
            sqlx::Error::Configuration(conf_err) => DbError::ConnectionError(conf_err.to_string()),
            sqlx::Error::PoolClosed => {
                DbError::ConnectionError("Pool de conexões fechado".to_string())
            }
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionError("Timeout no pool de conexões".to_string())
            }
            sqlx::Error::Migrate(e) => DbError::MigrationError(e.to_string()),
            _ => DbError::InternalError(format!("Erro inesperado: {:?}", error)),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(error: serde_json::Error) -> Self {
        DbError::InternalError(format!("Documento JSON inválido: {}", error))
    }
}
