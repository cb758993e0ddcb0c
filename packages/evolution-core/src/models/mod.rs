//! Modelos de dados do domínio
//!
//! Este módulo define as estruturas persistidas pelo repositório: clientes,
//! avaliações físicas, exames e protocolos de treino. Os nomes de campo no
//! JSON seguem o formato camelCase usado pelas coleções armazenadas.

pub mod avaliacao;
pub mod cliente;
pub mod exame;
pub mod protocolo;

pub use avaliacao::*;
pub use cliente::*;
pub use exame::*;
pub use protocolo::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadados comuns a toda entidade armazenada
///
/// Ausente no JSON de entrada (registro novo), assume o carimbo provisório.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Carimbo {
    /// Identificador único
    pub id: Uuid,
    /// Data e hora de criação do registro
    pub created_at: DateTime<Utc>,
    /// Data e hora da última atualização
    pub updated_at: DateTime<Utc>,
    /// Versão para controle de concorrência otimista (começa em 1)
    pub versao: u64,
}

impl Carimbo {
    /// Carimbo provisório para registros ainda não criados no repositório
    pub fn novo() -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::nil(),
            created_at: agora,
            updated_at: agora,
            versao: 0,
        }
    }
}

impl Default for Carimbo {
    fn default() -> Self {
        Self::novo()
    }
}
