//! Comparativos entre registros do mesmo cliente
//!
//! - Avaliações: diferenças campo a campo e veredito de evolução por
//!   pontuação (gordura em queda +2, massa magra em alta +2, peso estável
//!   dentro de 2 kg +1).
//! - Exames: diferença e variação percentual por parâmetro numérico comum,
//!   tendência geral SUBIU/DESCEU e, opcionalmente, leitura clínica guiada
//!   pela direção favorável de cada parâmetro.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::models::{AvaliacaoFisica, Exame, ResultadoExame, ValorResultado};

/// Limite de estabilidade de peso, em kg
const TOLERANCIA_PESO_KG: f64 = 2.0;
/// Variação percentual a partir da qual uma diferença é significativa
pub const LIMIAR_SIGNIFICANCIA_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Evolucao {
    Positiva,
    Negativa,
    Estavel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiferencasAvaliacao {
    pub peso: f64,
    pub percentual_gordura: f64,
    pub massa_magra: f64,
    pub imc: f64,
    pub circunferencias: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativoAvaliacoes {
    pub avaliacao_anterior: AvaliacaoFisica,
    pub avaliacao_atual: AvaliacaoFisica,
    pub diferencas: DiferencasAvaliacao,
    pub pontuacao: u8,
    pub evolucao: Evolucao,
}

/// Pontuação do veredito de evolução
pub fn pontuar_evolucao(diferencas: &DiferencasAvaliacao) -> u8 {
    let mut pontuacao = 0;
    if diferencas.percentual_gordura < 0.0 {
        pontuacao += 2;
    }
    if diferencas.massa_magra > 0.0 {
        pontuacao += 2;
    }
    if diferencas.peso.abs() <= TOLERANCIA_PESO_KG {
        pontuacao += 1;
    }
    pontuacao
}

pub fn veredito(pontuacao: u8) -> Evolucao {
    match pontuacao {
        p if p >= 3 => Evolucao::Positiva,
        p if p <= 1 => Evolucao::Negativa,
        _ => Evolucao::Estavel,
    }
}

/// Compara a avaliação `atual` com uma `anterior` do mesmo cliente.
///
/// Exige `anterior.data_avaliacao < atual.data_avaliacao` e o mesmo
/// conjunto de locais de circunferência nos dois registros.
pub fn comparar_avaliacoes(
    atual: &AvaliacaoFisica,
    anterior: &AvaliacaoFisica,
) -> Result<ComparativoAvaliacoes, DomainError> {
    if atual.cliente_id != anterior.cliente_id {
        return Err(DomainError::InvalidComparison(
            "avaliações de clientes diferentes".to_string(),
        ));
    }
    if anterior.data_avaliacao >= atual.data_avaliacao {
        return Err(DomainError::InvalidComparison(format!(
            "avaliação anterior ({}) não precede a atual ({})",
            anterior.data_avaliacao, atual.data_avaliacao
        )));
    }

    let locais_atuais: BTreeSet<&String> = atual.circunferencias.keys().collect();
    let locais_anteriores: BTreeSet<&String> = anterior.circunferencias.keys().collect();
    if locais_atuais != locais_anteriores {
        let divergentes: Vec<&str> = locais_atuais
            .symmetric_difference(&locais_anteriores)
            .map(|s| s.as_str())
            .collect();
        return Err(DomainError::IncompatibleRecords(format!(
            "circunferências divergentes: {}",
            divergentes.join(", ")
        )));
    }

    let circunferencias = atual
        .circunferencias
        .iter()
        .map(|(local, valor)| (local.clone(), valor - anterior.circunferencias[local]))
        .collect();

    let diferencas = DiferencasAvaliacao {
        peso: atual.peso - anterior.peso,
        percentual_gordura: atual.composicao_corporal.percentual_gordura
            - anterior.composicao_corporal.percentual_gordura,
        massa_magra: atual.composicao_corporal.massa_magra
            - anterior.composicao_corporal.massa_magra,
        imc: atual.imc - anterior.imc,
        circunferencias,
    };
    let pontuacao = pontuar_evolucao(&diferencas);

    Ok(ComparativoAvaliacoes {
        avaliacao_anterior: anterior.clone(),
        avaliacao_atual: atual.clone(),
        diferencas,
        pontuacao,
        evolucao: veredito(pontuacao),
    })
}

/// Direção bruta da variação de um parâmetro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direcao {
    Subiu,
    Desceu,
    Estavel,
}

/// Leitura da variação: a tendência geral legada ou a clínica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tendencia {
    Melhora,
    Piora,
    Estavel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiferencaParametro {
    pub parametro: String,
    pub valor_anterior: ValorResultado,
    pub valor_atual: ValorResultado,
    pub diferenca: f64,
    /// `None` quando o valor anterior é zero
    pub percentual: Option<f64>,
    pub significativo: bool,
    pub tendencia: Direcao,
    /// Preenchida apenas pela comparação com política de tendência
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avaliacao: Option<Tendencia>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativoExames {
    pub exame_anterior: Exame,
    pub exame_atual: Exame,
    pub diferencas: Vec<DiferencaParametro>,
    /// Regra legada: qualquer alta significativa é PIORA, qualquer queda
    /// significativa é MELHORA. Não considera se subir é bom ou ruim.
    pub tendencia: Tendencia,
    /// Leitura orientada pela direção favorável de cada parâmetro
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tendencia_clinica: Option<Tendencia>,
    pub alertas: Vec<String>,
}

/// Direção favorável de um parâmetro de exame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "tipo")]
pub enum DirecaoFavoravel {
    /// Quanto maior, melhor (ex.: HDL)
    Subir,
    /// Quanto menor, melhor (ex.: LDL, glicemia)
    Descer,
    /// Aproximar-se da faixa [min, max] é melhor
    FaixaReferencia { min: f64, max: f64 },
}

/// Mapa de parâmetro para direção favorável. Parâmetros sem entrada usam a
/// faixa extraída de `valorReferencia` do resultado e, se ela não for
/// legível, a regra legada (descer é melhor).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendPolicy {
    pub parametros: HashMap<String, DirecaoFavoravel>,
}

impl TrendPolicy {
    pub fn with(mut self, parametro: impl Into<String>, direcao: DirecaoFavoravel) -> Self {
        self.parametros.insert(parametro.into(), direcao);
        self
    }

    fn direcao_para(&self, resultado: &ResultadoExame) -> DirecaoFavoravel {
        if let Some(direcao) = self.parametros.get(&resultado.parametro) {
            return direcao.clone();
        }
        match faixa_referencia(&resultado.valor_referencia) {
            Some((min, max)) => DirecaoFavoravel::FaixaReferencia { min, max },
            None => DirecaoFavoravel::Descer,
        }
    }
}

/// Extrai a faixa de um texto de referência no formato "12.0 - 16.0".
/// Aceita vírgula decimal; limites abertos ("< 200") não são faixas.
pub fn faixa_referencia(texto: &str) -> Option<(f64, f64)> {
    let (min, max) = texto.split_once(" - ").or_else(|| texto.split_once('-'))?;
    let ler = |s: &str| s.trim().replace(',', ".").parse::<f64>().ok();
    let (min, max) = (ler(min)?, ler(max)?);
    (min <= max).then_some((min, max))
}

fn distancia_da_faixa(valor: f64, min: f64, max: f64) -> f64 {
    if valor < min {
        min - valor
    } else if valor > max {
        valor - max
    } else {
        0.0
    }
}

fn avaliar(direcao: &DirecaoFavoravel, anterior: f64, atual: f64) -> Tendencia {
    let melhora = match direcao {
        DirecaoFavoravel::Subir => atual.partial_cmp(&anterior),
        DirecaoFavoravel::Descer => anterior.partial_cmp(&atual),
        DirecaoFavoravel::FaixaReferencia { min, max } => {
            distancia_da_faixa(anterior, *min, *max)
                .partial_cmp(&distancia_da_faixa(atual, *min, *max))
        }
    };
    match melhora {
        Some(std::cmp::Ordering::Greater) => Tendencia::Melhora,
        Some(std::cmp::Ordering::Less) => Tendencia::Piora,
        _ => Tendencia::Estavel,
    }
}

fn validar_par_de_exames(atual: &Exame, anterior: &Exame) -> Result<(), DomainError> {
    if atual.cliente_id != anterior.cliente_id {
        return Err(DomainError::InvalidComparison(
            "exames de clientes diferentes".to_string(),
        ));
    }
    if atual.tipo_exame.nome != anterior.tipo_exame.nome {
        return Err(DomainError::IncompatibleRecords(format!(
            "tipos de exame diferentes: {} e {}",
            atual.tipo_exame.nome, anterior.tipo_exame.nome
        )));
    }
    if anterior.data_coleta > atual.data_coleta {
        return Err(DomainError::InvalidComparison(format!(
            "exame anterior ({}) coletado depois do atual ({})",
            anterior.data_coleta, atual.data_coleta
        )));
    }
    Ok(())
}

fn diferenca_parametro(
    resultado_atual: &ResultadoExame,
    resultado_anterior: &ResultadoExame,
) -> Option<DiferencaParametro> {
    let valor_atual = resultado_atual.valor.numerico()?;
    let valor_anterior = resultado_anterior.valor.numerico()?;
    let diferenca = valor_atual - valor_anterior;
    let percentual = (valor_anterior != 0.0).then(|| diferenca / valor_anterior * 100.0);
    let tendencia = if diferenca > 0.0 {
        Direcao::Subiu
    } else if diferenca < 0.0 {
        Direcao::Desceu
    } else {
        Direcao::Estavel
    };
    Some(DiferencaParametro {
        parametro: resultado_atual.parametro.clone(),
        valor_anterior: resultado_anterior.valor.clone(),
        valor_atual: resultado_atual.valor.clone(),
        diferenca,
        percentual,
        significativo: percentual.is_some_and(|p| p.abs() > LIMIAR_SIGNIFICANCIA_PCT),
        tendencia,
        avaliacao: None,
    })
}

fn tendencia_legada(diferencas: &[DiferencaParametro]) -> Tendencia {
    let significativas = || diferencas.iter().filter(|d| d.significativo);
    if significativas().any(|d| d.tendencia == Direcao::Subiu) {
        Tendencia::Piora
    } else if significativas().any(|d| d.tendencia == Direcao::Desceu) {
        Tendencia::Melhora
    } else {
        Tendencia::Estavel
    }
}

/// Compara dois exames do mesmo tipo e cliente. Parâmetros ausentes em um
/// dos exames ou sem valor numérico ficam de fora.
pub fn comparar_exames(atual: &Exame, anterior: &Exame) -> Result<ComparativoExames, DomainError> {
    validar_par_de_exames(atual, anterior)?;

    let diferencas: Vec<DiferencaParametro> = atual
        .resultados
        .iter()
        .filter_map(|resultado_atual| {
            let resultado_anterior = anterior
                .resultados
                .iter()
                .find(|r| r.parametro == resultado_atual.parametro)?;
            diferenca_parametro(resultado_atual, resultado_anterior)
        })
        .collect();

    let alertas = diferencas
        .iter()
        .filter(|d| d.significativo)
        .map(|d| format!("{}: {}", d.parametro, direcao_texto(d.tendencia)))
        .collect();

    Ok(ComparativoExames {
        exame_anterior: anterior.clone(),
        exame_atual: atual.clone(),
        tendencia: tendencia_legada(&diferencas),
        tendencia_clinica: None,
        diferencas,
        alertas,
    })
}

/// Como [`comparar_exames`], acrescentando a leitura clínica por parâmetro
/// segundo a `politica`.
pub fn comparar_exames_com_politica(
    atual: &Exame,
    anterior: &Exame,
    politica: &TrendPolicy,
) -> Result<ComparativoExames, DomainError> {
    let mut comparativo = comparar_exames(atual, anterior)?;

    for diferenca in &mut comparativo.diferencas {
        let Some(resultado) = atual
            .resultados
            .iter()
            .find(|r| r.parametro == diferenca.parametro)
        else {
            continue;
        };
        let (Some(antes), Some(depois)) = (
            diferenca.valor_anterior.numerico(),
            diferenca.valor_atual.numerico(),
        ) else {
            continue;
        };
        diferenca.avaliacao = Some(avaliar(&politica.direcao_para(resultado), antes, depois));
    }

    let significativas = || {
        comparativo
            .diferencas
            .iter()
            .filter(|d| d.significativo)
            .filter_map(|d| d.avaliacao)
    };
    let clinica = if significativas().any(|t| t == Tendencia::Piora) {
        Tendencia::Piora
    } else if significativas().any(|t| t == Tendencia::Melhora) {
        Tendencia::Melhora
    } else {
        Tendencia::Estavel
    };
    comparativo.tendencia_clinica = Some(clinica);
    Ok(comparativo)
}

fn direcao_texto(direcao: Direcao) -> &'static str {
    match direcao {
        Direcao::Subiu => "SUBIU",
        Direcao::Desceu => "DESCEU",
        Direcao::Estavel => "ESTAVEL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    fn avaliacao_posterior(base: &AvaliacaoFisica) -> AvaliacaoFisica {
        let mut atual = base.clone();
        atual.carimbo.id = Uuid::new_v4();
        atual.data_avaliacao = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        atual
    }

    #[test]
    fn test_scenario_positive_evolution() -> anyhow::Result<()> {
        let anterior = demo::avaliacao_joao(Uuid::new_v4());
        let mut atual = avaliacao_posterior(&anterior);
        atual.peso = 85.3;
        atual.composicao_corporal.percentual_gordura = 16.0;
        atual.composicao_corporal.massa_magra = 70.5;

        let comparativo = comparar_avaliacoes(&atual, &anterior)?;
        assert_eq!(comparativo.diferencas.peso, 85.3 - 85.5);
        assert_eq!(comparativo.pontuacao, 5);
        assert_eq!(comparativo.evolucao, Evolucao::Positiva);
        Ok(())
    }

    #[test]
    fn test_weight_loss_alone_is_not_positive() -> anyhow::Result<()> {
        let anterior = demo::avaliacao_joao(Uuid::new_v4());
        let mut atual = avaliacao_posterior(&anterior);
        atual.peso = 80.0;
        atual.composicao_corporal.percentual_gordura = 19.0;
        atual.composicao_corporal.massa_magra = 65.0;

        let comparativo = comparar_avaliacoes(&atual, &anterior)?;
        assert_eq!(comparativo.pontuacao, 0);
        assert_eq!(comparativo.evolucao, Evolucao::Negativa);
        Ok(())
    }

    #[test]
    fn test_veredito_bands() {
        assert_eq!(veredito(0), Evolucao::Negativa);
        assert_eq!(veredito(1), Evolucao::Negativa);
        assert_eq!(veredito(2), Evolucao::Estavel);
        assert_eq!(veredito(3), Evolucao::Positiva);
        assert_eq!(veredito(5), Evolucao::Positiva);
    }

    #[test]
    fn test_comparison_is_repeatable() -> anyhow::Result<()> {
        let anterior = demo::avaliacao_joao(Uuid::new_v4());
        let mut atual = avaliacao_posterior(&anterior);
        atual.composicao_corporal.massa_magra = 70.0;
        let primeiro = comparar_avaliacoes(&atual, &anterior)?;
        let segundo = comparar_avaliacoes(&atual, &anterior)?;
        assert_eq!(primeiro, segundo);
        Ok(())
    }

    #[test]
    fn test_circumference_deltas_keyed_like_input() -> anyhow::Result<()> {
        let anterior = demo::avaliacao_joao(Uuid::new_v4());
        let mut atual = avaliacao_posterior(&anterior);
        atual.circunferencias.insert("cintura".to_string(), 85.0);
        let comparativo = comparar_avaliacoes(&atual, &anterior)?;
        assert_eq!(comparativo.diferencas.circunferencias["cintura"], -3.0);
        assert_eq!(comparativo.diferencas.circunferencias["pescoco"], 0.0);
        assert_eq!(
            comparativo.diferencas.circunferencias.len(),
            anterior.circunferencias.len()
        );
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_order_and_foreign_records() {
        let anterior = demo::avaliacao_joao(Uuid::new_v4());
        let atual = avaliacao_posterior(&anterior);

        assert!(matches!(
            comparar_avaliacoes(&anterior, &atual),
            Err(DomainError::InvalidComparison(_))
        ));
        assert!(matches!(
            comparar_avaliacoes(&anterior, &anterior),
            Err(DomainError::InvalidComparison(_))
        ));

        let mut de_outro = atual.clone();
        de_outro.cliente_id = Uuid::new_v4();
        assert!(matches!(
            comparar_avaliacoes(&de_outro, &anterior),
            Err(DomainError::InvalidComparison(_))
        ));
    }

    #[test]
    fn test_rejects_mismatched_circumference_sites() {
        let anterior = demo::avaliacao_joao(Uuid::new_v4());
        let mut atual = avaliacao_posterior(&anterior);
        atual.circunferencias.remove("tornozelo");
        let err = comparar_avaliacoes(&atual, &anterior).unwrap_err();
        assert!(matches!(err, DomainError::IncompatibleRecords(_)));
        assert!(err.to_string().contains("tornozelo"));
    }

    fn exame_posterior(base: &Exame, valores: &[(&str, f64)]) -> Exame {
        let mut atual = base.clone();
        atual.carimbo.id = Uuid::new_v4();
        atual.data_coleta = base.data_coleta + Duration::days(30);
        for (parametro, valor) in valores {
            if let Some(r) = atual.resultados.iter_mut().find(|r| r.parametro == *parametro) {
                r.valor = ValorResultado::Numerico(*valor);
            }
        }
        atual
    }

    #[test]
    fn test_exam_compared_to_itself_is_stable() -> anyhow::Result<()> {
        let exame = demo::hemograma_joao(Uuid::new_v4());
        let comparativo = comparar_exames(&exame, &exame)?;
        assert_eq!(comparativo.diferencas.len(), exame.resultados.len());
        assert!(comparativo.diferencas.iter().all(|d| d.diferenca == 0.0));
        assert!(comparativo.diferencas.iter().all(|d| d.tendencia == Direcao::Estavel));
        assert_eq!(comparativo.tendencia, Tendencia::Estavel);
        assert!(comparativo.alertas.is_empty());
        Ok(())
    }

    #[test]
    fn test_exam_diff_excludes_unshared_parameters() -> anyhow::Result<()> {
        let anterior = demo::hemograma_joao(Uuid::new_v4());
        let mut atual = exame_posterior(&anterior, &[]);
        atual.resultados.retain(|r| r.parametro != "Hematócrito");
        atual.resultados.push(ResultadoExame {
            id: "9".to_string(),
            parametro: "Plaquetas".to_string(),
            valor: ValorResultado::Numerico(250_000.0),
            unidade: "/mm³".to_string(),
            valor_referencia: "150000 - 450000".to_string(),
            status: crate::models::StatusResultado::Normal,
            observacao: None,
        });
        let comparativo = comparar_exames(&atual, &anterior)?;
        let parametros: Vec<&str> = comparativo
            .diferencas
            .iter()
            .map(|d| d.parametro.as_str())
            .collect();
        assert_eq!(parametros, vec!["Hemoglobina", "Leucócitos"]);
        Ok(())
    }

    #[test]
    fn test_significant_rise_is_legacy_worsening() -> anyhow::Result<()> {
        let anterior = demo::hemograma_joao(Uuid::new_v4());
        // Hemoglobina +1.4% (não significativo), Leucócitos -24% (significativo)
        let atual = exame_posterior(&anterior, &[("Hemoglobina", 14.4), ("Leucócitos", 9500.0)]);
        let comparativo = comparar_exames(&atual, &anterior)?;
        assert_eq!(comparativo.tendencia, Tendencia::Melhora);
        assert_eq!(comparativo.alertas, vec!["Leucócitos: DESCEU".to_string()]);

        let atual = exame_posterior(&anterior, &[("Hemoglobina", 16.0), ("Leucócitos", 9500.0)]);
        let comparativo = comparar_exames(&atual, &anterior)?;
        assert_eq!(comparativo.tendencia, Tendencia::Piora);
        Ok(())
    }

    #[test]
    fn test_zero_previous_value_has_no_percentage() -> anyhow::Result<()> {
        let mut anterior = demo::hemograma_joao(Uuid::new_v4());
        anterior.resultados[0].valor = ValorResultado::Numerico(0.0);
        let atual = exame_posterior(&anterior, &[("Hemoglobina", 14.0)]);
        let comparativo = comparar_exames(&atual, &anterior)?;
        let hemoglobina = &comparativo.diferencas[0];
        assert_eq!(hemoglobina.percentual, None);
        assert!(!hemoglobina.significativo);
        assert_eq!(hemoglobina.tendencia, Direcao::Subiu);
        Ok(())
    }

    #[test]
    fn test_exam_preconditions() {
        let anterior = demo::hemograma_joao(Uuid::new_v4());
        let atual = exame_posterior(&anterior, &[]);

        let mut outro_tipo = atual.clone();
        outro_tipo.tipo_exame.nome = "Glicemia de Jejum".to_string();
        assert!(matches!(
            comparar_exames(&outro_tipo, &anterior),
            Err(DomainError::IncompatibleRecords(_))
        ));

        let mut outro_cliente = atual.clone();
        outro_cliente.cliente_id = Uuid::new_v4();
        assert!(matches!(
            comparar_exames(&outro_cliente, &anterior),
            Err(DomainError::InvalidComparison(_))
        ));

        assert!(matches!(
            comparar_exames(&anterior, &atual),
            Err(DomainError::InvalidComparison(_))
        ));
    }

    #[test]
    fn test_reference_range_policy_reads_falling_leukocytes_as_improvement(
    ) -> anyhow::Result<()> {
        let anterior = demo::hemograma_joao(Uuid::new_v4());
        // Hemoglobina 14.2 -> 11.0: queda significativa para fora da faixa 12-16
        let atual = exame_posterior(&anterior, &[("Hemoglobina", 11.0), ("Leucócitos", 9500.0)]);
        let comparativo = comparar_exames_com_politica(&atual, &anterior, &TrendPolicy::default())?;

        let por_parametro: HashMap<&str, Option<Tendencia>> = comparativo
            .diferencas
            .iter()
            .map(|d| (d.parametro.as_str(), d.avaliacao))
            .collect();
        assert_eq!(por_parametro["Hemoglobina"], Some(Tendencia::Piora));
        assert_eq!(por_parametro["Leucócitos"], Some(Tendencia::Melhora));
        assert_eq!(comparativo.tendencia_clinica, Some(Tendencia::Piora));
        // a regra legada continua intacta
        assert_eq!(comparativo.tendencia, Tendencia::Melhora);
        Ok(())
    }

    #[test]
    fn test_explicit_policy_overrides_reference_range() -> anyhow::Result<()> {
        let anterior = demo::hemograma_joao(Uuid::new_v4());
        let atual = exame_posterior(&anterior, &[("Hemoglobina", 16.5)]);
        let politica = TrendPolicy::default().with("Hemoglobina", DirecaoFavoravel::Subir);
        let comparativo = comparar_exames_com_politica(&atual, &anterior, &politica)?;
        assert_eq!(comparativo.diferencas[0].avaliacao, Some(Tendencia::Melhora));
        assert_eq!(comparativo.tendencia_clinica, Some(Tendencia::Melhora));
        assert_eq!(comparativo.tendencia, Tendencia::Piora);
        Ok(())
    }

    #[test]
    fn test_faixa_referencia_parsing() {
        assert_eq!(faixa_referencia("12.0 - 16.0"), Some((12.0, 16.0)));
        assert_eq!(faixa_referencia("4000 - 11000"), Some((4000.0, 11000.0)));
        assert_eq!(faixa_referencia("3,5-5,0"), Some((3.5, 5.0)));
        assert_eq!(faixa_referencia("< 200"), None);
        assert_eq!(faixa_referencia("Não reagente"), None);
        assert_eq!(faixa_referencia("16 - 12"), None);
    }
}
