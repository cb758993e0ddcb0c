//! Erros da API e seu mapeamento para respostas HTTP

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use evolution_core::{DbError, DomainError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Dados inválidos: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Erro interno: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(erro) => match erro {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::DuplicateIdentity(_) | DomainError::VersionConflict { .. } => {
                    StatusCode::CONFLICT
                }
                DomainError::InvalidMeasurement(_)
                | DomainError::InvalidComparison(_)
                | DomainError::IncompatibleRecords(_)
                | DomainError::InvalidTransition { .. }
                | DomainError::InvalidPagination(_)
                | DomainError::InvalidPatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(erro) => match erro.downcast_ref::<DbError>() {
                Some(DbError::ConstraintViolation(_)) => StatusCode::CONFLICT,
                Some(DbError::NotFound(_)) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mensagem = match &self {
            ApiError::Internal(erro) => format!("{:#}", erro),
            outro => outro.to_string(),
        };
        let mensagem = if status.is_server_error() {
            error!("Falha ao atender requisição: {}", mensagem);
            "Erro interno do servidor".to_string()
        } else {
            mensagem
        };
        (status, Json(json!({ "erro": mensagem }))).into_response()
    }
}
