//! Séries temporais para os gráficos de evolução
//!
//! Cada chamada percorre os registros de novo e devolve um instantâneo; nada
//! é mantido em cache entre consultas.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::comparison::LIMIAR_SIGNIFICANCIA_PCT;
use crate::models::{AvaliacaoFisica, Exame, StatusResultado};

/// Métrica acompanhada ao longo das avaliações
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "metrica", content = "local")]
pub enum Metric {
    Peso,
    PercentualGordura,
    MassaMagra,
    MassaMuscular,
    Imc,
    /// Circunferência de um local específico ("cintura", "quadril", ...)
    Circunferencia(String),
}

impl Metric {
    pub fn extrair(&self, avaliacao: &AvaliacaoFisica) -> Option<f64> {
        match self {
            Metric::Peso => Some(avaliacao.peso),
            Metric::PercentualGordura => Some(avaliacao.composicao_corporal.percentual_gordura),
            Metric::MassaMagra => Some(avaliacao.composicao_corporal.massa_magra),
            Metric::MassaMuscular => Some(avaliacao.composicao_corporal.massa_muscular),
            Metric::Imc => Some(avaliacao.imc),
            Metric::Circunferencia(local) => avaliacao.circunferencias.get(local).copied(),
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    /// Aceita "peso", "percentualGordura", "massaMagra", "massaMuscular",
    /// "imc" e "circunferencia:<local>"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "peso" => Ok(Metric::Peso),
            "percentualGordura" => Ok(Metric::PercentualGordura),
            "massaMagra" => Ok(Metric::MassaMagra),
            "massaMuscular" => Ok(Metric::MassaMuscular),
            "imc" => Ok(Metric::Imc),
            outro => match outro.split_once(':') {
                Some(("circunferencia", local)) if !local.is_empty() => {
                    Ok(Metric::Circunferencia(local.to_string()))
                }
                _ => Err(format!("métrica desconhecida: {}", outro)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PontoSerie {
    pub data: NaiveDate,
    pub valor: f64,
}

/// Avaliações realizadas do cliente, em ordem cronológica (empates pela
/// data de criação)
pub fn avaliacoes_realizadas<'a>(
    avaliacoes: impl Iterator<Item = &'a AvaliacaoFisica>,
    cliente_id: Uuid,
) -> Vec<&'a AvaliacaoFisica> {
    let mut realizadas: Vec<&AvaliacaoFisica> = avaliacoes
        .filter(|a| a.cliente_id == cliente_id && a.realizada())
        .collect();
    realizadas.sort_by_key(|a| (a.data_avaliacao, a.carimbo.created_at));
    realizadas
}

/// Série de uma métrica para o cliente. Avaliações sem o local de
/// circunferência pedido ficam de fora.
pub fn evolucao<'a>(
    avaliacoes: impl Iterator<Item = &'a AvaliacaoFisica>,
    cliente_id: Uuid,
    metrica: &Metric,
) -> Vec<PontoSerie> {
    avaliacoes_realizadas(avaliacoes, cliente_id)
        .into_iter()
        .filter_map(|a| {
            metrica.extrair(a).map(|valor| PontoSerie {
                data: a.data_avaliacao,
                valor,
            })
        })
        .collect()
}

/// Séries principais do relatório de avaliação
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricoAvaliacoes {
    #[serde(rename = "evolucaoPeso")]
    pub peso: Vec<PontoSerie>,
    #[serde(rename = "evolucaoGordura")]
    pub percentual_gordura: Vec<PontoSerie>,
    #[serde(rename = "evolucaoMassaMagra")]
    pub massa_magra: Vec<PontoSerie>,
    #[serde(rename = "evolucaoImc")]
    pub imc: Vec<PontoSerie>,
}

/// Peso, gordura, massa magra e IMC de uma vez, opcionalmente limitados a
/// um intervalo inclusivo de datas
pub fn historico_avaliacoes<'a>(
    avaliacoes: impl Iterator<Item = &'a AvaliacaoFisica>,
    cliente_id: Uuid,
    desde: Option<NaiveDate>,
    ate: Option<NaiveDate>,
) -> HistoricoAvaliacoes {
    let no_intervalo = |a: &&AvaliacaoFisica| {
        desde.map_or(true, |d| a.data_avaliacao >= d) && ate.map_or(true, |d| a.data_avaliacao <= d)
    };
    let selecionadas: Vec<&AvaliacaoFisica> = avaliacoes_realizadas(avaliacoes, cliente_id)
        .into_iter()
        .filter(no_intervalo)
        .collect();
    let serie = |metrica: Metric| -> Vec<PontoSerie> {
        selecionadas
            .iter()
            .filter_map(|a| {
                metrica.extrair(a).map(|valor| PontoSerie {
                    data: a.data_avaliacao,
                    valor,
                })
            })
            .collect()
    };
    HistoricoAvaliacoes {
        peso: serie(Metric::Peso),
        percentual_gordura: serie(Metric::PercentualGordura),
        massa_magra: serie(Metric::MassaMagra),
        imc: serie(Metric::Imc),
    }
}

/// Forma da curva de um parâmetro de exame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormaSerie {
    Crescente,
    Decrescente,
    Estavel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PontoExame {
    pub data: DateTime<Utc>,
    pub valor: f64,
    pub status: StatusResultado,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraficoEvolutivo {
    pub parametro: String,
    pub dados: Vec<PontoExame>,
    pub tendencia: FormaSerie,
}

/// Compara o último valor com o primeiro usando o mesmo limiar de
/// significância dos comparativos
pub fn forma_da_serie(pontos: &[PontoExame]) -> FormaSerie {
    let (Some(primeiro), Some(ultimo)) = (pontos.first(), pontos.last()) else {
        return FormaSerie::Estavel;
    };
    if primeiro.valor == 0.0 {
        return FormaSerie::Estavel;
    }
    let percentual = (ultimo.valor - primeiro.valor) / primeiro.valor * 100.0;
    if percentual > LIMIAR_SIGNIFICANCIA_PCT {
        FormaSerie::Crescente
    } else if percentual < -LIMIAR_SIGNIFICANCIA_PCT {
        FormaSerie::Decrescente
    } else {
        FormaSerie::Estavel
    }
}

/// Um gráfico por parâmetro do exame de referência, sobre o histórico
/// (qualquer ordem) do mesmo tipo. Só valores numéricos entram.
pub fn graficos_exame(referencia: &Exame, historico: &[Exame]) -> Vec<GraficoEvolutivo> {
    let mut cronologico: Vec<&Exame> = historico.iter().collect();
    cronologico.sort_by_key(|e| e.data_coleta);

    referencia
        .resultados
        .iter()
        .map(|resultado| {
            let dados: Vec<PontoExame> = cronologico
                .iter()
                .filter_map(|exame| {
                    let r = exame
                        .resultados
                        .iter()
                        .find(|r| r.parametro == resultado.parametro)?;
                    Some(PontoExame {
                        data: exame.data_coleta,
                        valor: r.valor.numerico()?,
                        status: r.status,
                    })
                })
                .collect();
            GraficoEvolutivo {
                parametro: resultado.parametro.clone(),
                tendencia: forma_da_serie(&dados),
                dados,
            }
        })
        .collect()
}
