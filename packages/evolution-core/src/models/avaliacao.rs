use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Carimbo, ClienteResumo};
use crate::metrics::{ClassificacaoGordura, ClassificacaoImc};

/// Tipo da avaliação física
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoAvaliacao {
    Inicial,
    Reavaliacao,
    Controle,
}

impl std::fmt::Display for TipoAvaliacao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TipoAvaliacao::Inicial => write!(f, "INICIAL"),
            TipoAvaliacao::Reavaliacao => write!(f, "REAVALIACAO"),
            TipoAvaliacao::Controle => write!(f, "CONTROLE"),
        }
    }
}

/// Ciclo de vida da avaliação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusAvaliacao {
    /// Agendada, ainda sem medidas válidas
    Agendada,
    /// Realizada; entra nas séries de evolução
    Realizada,
    Cancelada,
}

impl std::fmt::Display for StatusAvaliacao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusAvaliacao::Agendada => write!(f, "AGENDADA"),
            StatusAvaliacao::Realizada => write!(f, "REALIZADA"),
            StatusAvaliacao::Cancelada => write!(f, "CANCELADA"),
        }
    }
}

/// Composição corporal derivada (bioimpedância ou protocolo de dobras)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposicaoCorporal {
    pub percentual_gordura: f64,
    pub massa_gorda: f64,
    pub massa_magra: f64,
    pub massa_muscular: f64,
    /// Água corporal em %
    pub agua_corporal: f64,
    pub massa_ossea: f64,
    /// Taxa metabólica basal em kcal
    pub taxa_metabolica: f64,
}

/// Dobras cutâneas em mm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DobrasCutaneas {
    pub triceps: f64,
    pub biceps: f64,
    pub subescapular: f64,
    pub suprailiaca: f64,
    pub abdominal: f64,
    pub coxa: f64,
    pub panturrilha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flexibilidade {
    /// Banco de Wells, em cm
    pub sentar_alcancar: f64,
    /// Em graus
    pub flexao_ombro: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forca {
    pub preensao_manual_direita: f64,
    pub preensao_manual_esquerda: f64,
    /// Repetições
    pub flexao_braco: u32,
    /// Repetições
    pub abdominal: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resistencia {
    /// ml/kg/min
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vo2_max: Option<f64>,
    pub frequencia_cardiaca_repouso: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequencia_cardiaca_maxima: Option<u32>,
    /// Distância em metros
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teste_cooper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestesFisicos {
    pub flexibilidade: Flexibilidade,
    pub forca: Forca,
    pub resistencia: Resistencia,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressaoArterial {
    pub sistolica: u32,
    pub diastolica: u32,
    pub frequencia_cardiaca: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NivelAtividade {
    Sedentario,
    Leve,
    Moderado,
    Intenso,
    MuitoIntenso,
}

/// Entrevista de entrada
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anamnese {
    pub objetivo_principal: String,
    pub historico_lesoes: String,
    pub medicamentos: String,
    pub restricoes_medicas: String,
    pub nivel_atividade: NivelAtividade,
    /// Vezes por semana
    pub frequencia_exercicio: u32,
    /// Minutos por sessão
    pub tempo_exercicio: u32,
    #[serde(default)]
    pub modalidades_preferidas: Vec<String>,
    #[serde(default)]
    pub observacoes_gerais: String,
}

/// Posição de uma foto da avaliação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseFoto {
    Frente,
    PerfilDireito,
    PerfilEsquerdo,
    Costas,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fotos {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frente: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perfil_direito: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perfil_esquerdo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

impl Fotos {
    pub fn definir(&mut self, pose: PoseFoto, url: String) {
        let slot = match pose {
            PoseFoto::Frente => &mut self.frente,
            PoseFoto::PerfilDireito => &mut self.perfil_direito,
            PoseFoto::PerfilEsquerdo => &mut self.perfil_esquerdo,
            PoseFoto::Costas => &mut self.costas,
        };
        *slot = Some(url);
    }
}

/// Conclusões da avaliação. As classificações são sempre recalculadas a
/// partir das medidas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resultados {
    pub classificacao_imc: ClassificacaoImc,
    pub classificacao_gordura: ClassificacaoGordura,
    #[serde(default)]
    pub pontos_fortes: Vec<String>,
    #[serde(default)]
    pub pontos_melhoria: Vec<String>,
    #[serde(default)]
    pub recomendacoes: Vec<String>,
}

impl Default for Resultados {
    fn default() -> Self {
        Self {
            classificacao_imc: ClassificacaoImc::PesoNormal,
            classificacao_gordura: ClassificacaoGordura::Normal,
            pontos_fortes: Vec::new(),
            pontos_melhoria: Vec::new(),
            recomendacoes: Vec::new(),
        }
    }
}

/// Avaliação física de um cliente
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvaliacaoFisica {
    #[serde(flatten)]
    pub carimbo: Carimbo,
    pub cliente_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliente: Option<ClienteResumo>,
    pub data_avaliacao: NaiveDate,
    pub tipo: TipoAvaliacao,
    pub status: StatusAvaliacao,

    /// Peso em kg
    pub peso: f64,
    /// Altura em metros
    pub altura: f64,
    /// Sempre `peso / altura²` com uma casa decimal
    #[serde(default)]
    pub imc: f64,

    /// Circunferências em cm, por local de medida
    pub circunferencias: BTreeMap<String, f64>,
    pub composicao_corporal: ComposicaoCorporal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dobras_cutaneas: Option<DobrasCutaneas>,
    pub testes_fisicos: TestesFisicos,
    pub pressao_arterial: PressaoArterial,
    pub anamnese: Anamnese,
    #[serde(default)]
    pub fotos: Fotos,
    #[serde(default)]
    pub resultados: Resultados,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxima_avaliacao: Option<NaiveDate>,
}

impl AvaliacaoFisica {
    pub fn id(&self) -> Uuid {
        self.carimbo.id
    }

    pub fn realizada(&self) -> bool {
        self.status == StatusAvaliacao::Realizada
    }
}
