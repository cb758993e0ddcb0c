use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Carimbo, ClienteResumo, Genero};
use crate::error::DomainError;

/// Entrada do catálogo de tipos de exame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipoExame {
    pub id: String,
    pub nome: String,
    pub codigo: String,
    pub categoria: String,
    pub descricao: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparacao: Option<String>,
    /// Horas de jejum exigidas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jejum: Option<u32>,
    #[serde(default)]
    pub restricoes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoriaExame {
    pub id: String,
    pub nome: String,
    pub cor: String,
    pub icone: String,
    pub descricao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Laboratorio {
    pub id: String,
    pub nome: String,
    pub cnpj: String,
    pub endereco: String,
    pub telefone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub credenciamento: Vec<String>,
    #[serde(default)]
    pub especialidades: Vec<String>,
    /// Prazo médio de entrega em horas
    pub tempo_medio_resultado: u32,
}

/// Estados do exame.
///
/// Fluxo normal: `Solicitado -> Agendado -> Coletado -> Processando -> Concluido`.
/// `Cancelado` e `Reagendado` são alcançáveis de qualquer estado não terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusExame {
    Solicitado,
    Agendado,
    Coletado,
    Processando,
    Concluido,
    Cancelado,
    Reagendado,
}

impl StatusExame {
    /// Posição no fluxo normal; `None` para estados fora dele
    fn ordem(self) -> Option<u8> {
        match self {
            StatusExame::Solicitado => Some(0),
            StatusExame::Agendado => Some(1),
            StatusExame::Coletado => Some(2),
            StatusExame::Processando => Some(3),
            StatusExame::Concluido => Some(4),
            StatusExame::Cancelado | StatusExame::Reagendado => None,
        }
    }

    pub fn terminal(self) -> bool {
        matches!(self, StatusExame::Concluido | StatusExame::Cancelado)
    }

    /// Estados aceitos na criação de um exame
    pub fn inicial(self) -> bool {
        matches!(self, StatusExame::Solicitado | StatusExame::Agendado)
    }

    /// Ainda aguardando resultado
    pub fn pendente(self) -> bool {
        matches!(
            self,
            StatusExame::Solicitado
                | StatusExame::Agendado
                | StatusExame::Coletado
                | StatusExame::Processando
        )
    }

    pub fn pode_transicionar_para(self, destino: StatusExame) -> bool {
        if self.terminal() || self == destino {
            return false;
        }
        match destino {
            StatusExame::Cancelado => true,
            StatusExame::Reagendado => true,
            StatusExame::Solicitado => false,
            _ => match (self.ordem(), destino.ordem()) {
                // Reagendado retorna ao fluxo a partir do agendamento
                (None, Some(alvo)) => alvo >= 1,
                (Some(atual), Some(alvo)) => alvo > atual,
                _ => false,
            },
        }
    }

    pub fn transicionar(self, destino: StatusExame) -> Result<StatusExame, DomainError> {
        if self.pode_transicionar_para(destino) {
            Ok(destino)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.to_string(),
                to: destino.to_string(),
            })
        }
    }
}

impl std::fmt::Display for StatusExame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusExame::Solicitado => write!(f, "SOLICITADO"),
            StatusExame::Agendado => write!(f, "AGENDADO"),
            StatusExame::Coletado => write!(f, "COLETADO"),
            StatusExame::Processando => write!(f, "PROCESSANDO"),
            StatusExame::Concluido => write!(f, "CONCLUIDO"),
            StatusExame::Cancelado => write!(f, "CANCELADO"),
            StatusExame::Reagendado => write!(f, "REAGENDADO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrioridadeExame {
    Baixa,
    Normal,
    Alta,
    Urgente,
}

/// Situação de um parâmetro frente à referência
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusResultado {
    Normal,
    Alterado,
    Critico,
}

/// Valor de um parâmetro: numérico ou descritivo ("reagente", "ausente", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValorResultado {
    Numerico(f64),
    Texto(String),
}

impl ValorResultado {
    /// Valor numérico finito, aceitando texto que seja um número
    /// ("NaN" e "inf" não contam)
    pub fn numerico(&self) -> Option<f64> {
        let valor = match self {
            ValorResultado::Numerico(v) => Some(*v),
            ValorResultado::Texto(t) => t.trim().replace(',', ".").parse::<f64>().ok(),
        };
        valor.filter(|v| v.is_finite())
    }
}

impl std::fmt::Display for ValorResultado {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValorResultado::Numerico(v) => write!(f, "{}", v),
            ValorResultado::Texto(t) => write!(f, "{}", t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultadoExame {
    pub id: String,
    pub parametro: String,
    pub valor: ValorResultado,
    pub unidade: String,
    /// Faixa de referência em texto, por exemplo "12.0 - 16.0"
    pub valor_referencia: String,
    pub status: StatusResultado,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacao: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoArquivo {
    Pdf,
    Imagem,
    Dicom,
    Documento,
}

impl TipoArquivo {
    /// Deduz o tipo pela extensão do nome do arquivo
    pub fn pelo_nome(nome: &str) -> Self {
        let extensao = nome
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match extensao.as_str() {
            "pdf" => TipoArquivo::Pdf,
            "jpg" | "jpeg" | "png" | "gif" => TipoArquivo::Imagem,
            "dcm" | "dicom" => TipoArquivo::Dicom,
            _ => TipoArquivo::Documento,
        }
    }
}

/// Metadados de um anexo. `criptografado` só é verdadeiro quando o conteúdo
/// foi efetivamente selado com a chave de dados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArquivoExame {
    pub id: Uuid,
    pub nome: String,
    pub tipo: TipoArquivo,
    pub url: String,
    /// Tamanho do conteúdo original em bytes
    pub tamanho: u64,
    pub data_upload: DateTime<Utc>,
    /// "sha256:<hex>" do conteúdo original
    pub checksum: String,
    pub criptografado: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValorReferencia {
    pub parametro: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genero: Option<Genero>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idade_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idade_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_texto: Option<String>,
    pub unidade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacao: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoAlerta {
    Critico,
    Alterado,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertaExame {
    pub id: Uuid,
    pub tipo: TipoAlerta,
    pub parametro: String,
    pub valor: ValorResultado,
    pub mensagem: String,
    pub data_alerta: DateTime<Utc>,
    pub visualizado: bool,
}

/// Exame laboratorial de um cliente
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exame {
    #[serde(flatten)]
    pub carimbo: Carimbo,
    pub cliente_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliente: Option<ClienteResumo>,
    pub tipo_exame: TipoExame,
    pub categoria: CategoriaExame,
    pub laboratorio: Laboratorio,
    pub medico_solicitante: String,
    pub data_coleta: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_resultado: Option<DateTime<Utc>>,
    pub status: StatusExame,
    pub prioridade: PrioridadeExame,
    #[serde(default)]
    pub resultados: Vec<ResultadoExame>,
    #[serde(default)]
    pub arquivos: Vec<ArquivoExame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacoes_medicas: Option<String>,
    #[serde(default)]
    pub valores_referencia: Vec<ValorReferencia>,
    /// Derivado: exatamente os resultados com status diferente de `Normal`
    #[serde(default)]
    pub alertas: Vec<AlertaExame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximo_exame: Option<chrono::NaiveDate>,
}

impl Exame {
    pub fn id(&self) -> Uuid {
        self.carimbo.id
    }

    /// Regera os alertas a partir dos resultados. Alertas que continuam
    /// valendo (mesmo parâmetro e tipo) preservam id e leitura.
    pub fn derivar_alertas(&mut self, agora: DateTime<Utc>) {
        let anteriores = std::mem::take(&mut self.alertas);
        self.alertas = self
            .resultados
            .iter()
            .filter_map(|resultado| {
                let tipo = match resultado.status {
                    StatusResultado::Normal => return None,
                    StatusResultado::Alterado => TipoAlerta::Alterado,
                    StatusResultado::Critico => TipoAlerta::Critico,
                };
                let existente = anteriores
                    .iter()
                    .find(|a| a.parametro == resultado.parametro && a.tipo == tipo);
                Some(AlertaExame {
                    id: existente.map(|a| a.id).unwrap_or_else(Uuid::new_v4),
                    tipo,
                    parametro: resultado.parametro.clone(),
                    valor: resultado.valor.clone(),
                    mensagem: mensagem_alerta(resultado),
                    data_alerta: existente.map(|a| a.data_alerta).unwrap_or(agora),
                    visualizado: existente.map(|a| a.visualizado).unwrap_or(false),
                })
            })
            .collect();
    }

    pub fn possui_status(&self, status: StatusResultado) -> bool {
        self.resultados.iter().any(|r| r.status == status)
    }
}

fn mensagem_alerta(resultado: &ResultadoExame) -> String {
    match resultado.status {
        StatusResultado::Critico => format!(
            "{} em nível crítico ({} {}; referência {})",
            resultado.parametro, resultado.valor, resultado.unidade, resultado.valor_referencia
        ),
        _ => format!(
            "{} fora do valor de referência ({} {}; referência {})",
            resultado.parametro, resultado.valor, resultado.unidade, resultado.valor_referencia
        ),
    }
}
