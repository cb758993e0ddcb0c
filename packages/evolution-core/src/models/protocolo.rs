use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Carimbo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoProtocolo {
    PreDefinido,
    Personalizado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NivelProtocolo {
    Iniciante,
    Intermediario,
    Avancado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusProtocolo {
    Ativo,
    Inativo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercicio {
    pub id: String,
    pub nome: String,
    pub grupo_muscular: String,
    pub series: u32,
    /// Faixa ou número de repetições ("8-12", "15")
    pub repeticoes: String,
    /// Carga em kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carga: Option<f64>,
    /// Descanso entre séries em segundos
    pub descanso: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

/// Programa de treino, pré-definido ou personalizado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocolo {
    #[serde(flatten)]
    pub carimbo: Carimbo,
    pub nome: String,
    pub descricao: String,
    pub tipo: TipoProtocolo,
    pub nivel: NivelProtocolo,
    pub duracao_semanas: u32,
    pub objetivo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
    #[serde(default)]
    pub exercicios: Vec<Exercicio>,
    #[serde(default)]
    pub anexos: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    pub status: StatusProtocolo,
}

impl Protocolo {
    pub fn id(&self) -> Uuid {
        self.carimbo.id
    }

    /// Cópia PERSONALIZADO com outro nome e carimbo provisório; exercícios,
    /// anexos e links são mantidos
    pub fn copiar(&self, nome: &str) -> Protocolo {
        Protocolo {
            carimbo: Carimbo::novo(),
            nome: nome.to_string(),
            tipo: TipoProtocolo::Personalizado,
            ..self.clone()
        }
    }
}
