//! Calculadoras avulsas de IMC e percentual de gordura

use axum::Json;
use evolution_core::{
    metrics::{
        calcular_imc, classificar_imc, classificar_percentual_gordura, ClassificacaoGordura,
        ClassificacaoImc,
    },
    models::Genero,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct ImcRequest {
    /// Peso em kg
    #[validate(range(min = 1.0, max = 700.0, message = "Peso deve estar entre 1 e 700 kg"))]
    pub peso: f64,
    /// Altura em metros
    #[validate(range(min = 0.3, max = 3.0, message = "Altura deve estar entre 0,3 e 3 m"))]
    pub altura: f64,
}

#[derive(Debug, Serialize)]
pub struct ImcResponse {
    pub imc: f64,
    pub classificacao: ClassificacaoImc,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GorduraRequest {
    #[validate(range(min = 0.0, max = 100.0, message = "Percentual deve estar entre 0 e 100"))]
    pub percentual: f64,
    pub genero: Genero,
}

#[derive(Debug, Serialize)]
pub struct GorduraResponse {
    pub classificacao: ClassificacaoGordura,
}

pub async fn imc(Json(req): Json<ImcRequest>) -> Result<Json<ImcResponse>, ApiError> {
    req.validate()?;
    let imc = calcular_imc(req.peso, req.altura)?;
    Ok(Json(ImcResponse {
        imc,
        classificacao: classificar_imc(imc),
    }))
}

pub async fn gordura(Json(req): Json<GorduraRequest>) -> Result<Json<GorduraResponse>, ApiError> {
    req.validate()?;
    Ok(Json(GorduraResponse {
        classificacao: classificar_percentual_gordura(req.percentual, req.genero),
    }))
}
