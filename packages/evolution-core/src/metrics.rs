//! Cálculos antropométricos
//!
//! Funções puras sobre medidas brutas. As faixas seguem a convenção
//! limite inferior inclusivo / superior exclusivo: um valor exatamente no
//! limiar cai na faixa de cima.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::models::Genero;

/// Faixas de IMC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificacaoImc {
    AbaixoPeso,
    PesoNormal,
    Sobrepeso,
    #[serde(rename = "OBESIDADE_I")]
    ObesidadeI,
    #[serde(rename = "OBESIDADE_II")]
    ObesidadeII,
    #[serde(rename = "OBESIDADE_III")]
    ObesidadeIII,
}

/// Faixas de percentual de gordura
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificacaoGordura {
    MuitoBaixo,
    Baixo,
    Normal,
    Alto,
    MuitoAlto,
}

const LIMIARES_IMC: [(f64, ClassificacaoImc); 5] = [
    (18.5, ClassificacaoImc::AbaixoPeso),
    (25.0, ClassificacaoImc::PesoNormal),
    (30.0, ClassificacaoImc::Sobrepeso),
    (35.0, ClassificacaoImc::ObesidadeI),
    (40.0, ClassificacaoImc::ObesidadeII),
];

const LIMIARES_GORDURA_MASCULINO: [f64; 4] = [6.0, 14.0, 18.0, 25.0];
const LIMIARES_GORDURA_FEMININO: [f64; 4] = [16.0, 21.0, 25.0, 32.0];

/// Arredonda para uma casa decimal
pub fn arredondar_1(valor: f64) -> f64 {
    (valor * 10.0).round() / 10.0
}

/// IMC = peso / altura², com uma casa decimal.
///
/// Peso e altura precisam ser finitos e positivos.
pub fn calcular_imc(peso: f64, altura: f64) -> Result<f64, DomainError> {
    if !peso.is_finite() || peso <= 0.0 {
        return Err(DomainError::InvalidMeasurement(format!(
            "peso deve ser positivo, recebido {}",
            peso
        )));
    }
    if !altura.is_finite() || altura <= 0.0 {
        return Err(DomainError::InvalidMeasurement(format!(
            "altura deve ser positiva, recebida {}",
            altura
        )));
    }
    Ok(arredondar_1(peso / (altura * altura)))
}

pub fn classificar_imc(imc: f64) -> ClassificacaoImc {
    LIMIARES_IMC
        .iter()
        .find(|(limite, _)| imc < *limite)
        .map(|(_, classe)| *classe)
        .unwrap_or(ClassificacaoImc::ObesidadeIII)
}

pub fn classificar_percentual_gordura(percentual: f64, genero: Genero) -> ClassificacaoGordura {
    let limiares = match genero {
        Genero::Masculino => &LIMIARES_GORDURA_MASCULINO,
        Genero::Feminino => &LIMIARES_GORDURA_FEMININO,
    };
    let faixas = [
        ClassificacaoGordura::MuitoBaixo,
        ClassificacaoGordura::Baixo,
        ClassificacaoGordura::Normal,
        ClassificacaoGordura::Alto,
    ];
    limiares
        .iter()
        .zip(faixas)
        .find(|(limite, _)| percentual < **limite)
        .map(|(_, classe)| classe)
        .unwrap_or(ClassificacaoGordura::MuitoAlto)
}
