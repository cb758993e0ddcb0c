//! Rotas de avaliações físicas e séries de evolução do cliente

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use evolution_core::{
    clinic::{EstatisticasAvaliacoes, RelatorioAvaliacao},
    comparison::ComparativoAvaliacoes,
    models::{AvaliacaoFisica, PoseFoto},
    timeseries::{HistoricoAvaliacoes, Metric, PontoSerie},
    Page,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::{expected_version, list_query, ComparativoParams};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvaliacaoParams {
    page: Option<usize>,
    size: Option<usize>,
    search: Option<String>,
    cliente_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EvolucaoParams {
    metrica: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoricoParams {
    desde: Option<NaiveDate>,
    ate: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FotoRequest {
    pose: PoseFoto,
    #[validate(length(min = 1, max = 2048, message = "URL da foto inválida"))]
    url: String,
}

pub async fn list_assessments(
    State(state): State<AppState>,
    Query(params): Query<AvaliacaoParams>,
) -> Result<Json<Page<AvaliacaoFisica>>, ApiError> {
    let query = list_query(params.page, params.size, params.search);
    let clinic = state.clinic.read().await;
    Ok(Json(clinic.list_assessments(&query, params.cliente_id)?))
}

pub async fn create_assessment(
    State(state): State<AppState>,
    Json(avaliacao): Json<AvaliacaoFisica>,
) -> Result<(StatusCode, Json<AvaliacaoFisica>), ApiError> {
    let criada = state
        .mutate(move |clinic| clinic.create_assessment(avaliacao))
        .await?;
    Ok((StatusCode::CREATED, Json(criada)))
}

pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AvaliacaoFisica>, ApiError> {
    let clinic = state.clinic.read().await;
    Ok(Json(clinic.get_assessment(id)?.clone()))
}

pub async fn update_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Result<Json<AvaliacaoFisica>, ApiError> {
    let esperada = expected_version(&headers)?;
    let atualizada = state
        .mutate(move |clinic| clinic.update_assessment(id, patch, esperada))
        .await?;
    Ok(Json(atualizada))
}

pub async fn delete_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.mutate(move |clinic| clinic.delete_assessment(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assessment_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RelatorioAvaliacao>, ApiError> {
    Ok(Json(state.clinic.read().await.assessment_report(id)?))
}

pub async fn compare_assessments(
    State(state): State<AppState>,
    Query(params): Query<ComparativoParams>,
) -> Result<Json<ComparativoAvaliacoes>, ApiError> {
    let clinic = state.clinic.read().await;
    Ok(Json(clinic.compare_assessments(params.atual, params.anterior)?))
}

pub async fn assessment_stats(State(state): State<AppState>) -> Json<EstatisticasAvaliacoes> {
    Json(state.clinic.read().await.assessment_stats())
}

pub async fn attach_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(foto): Json<FotoRequest>,
) -> Result<Json<AvaliacaoFisica>, ApiError> {
    foto.validate()?;
    let atualizada = state
        .mutate(move |clinic| clinic.attach_photo(id, foto.pose, foto.url))
        .await?;
    Ok(Json(atualizada))
}

/// Série de uma métrica nas avaliações realizadas do cliente
pub async fn client_evolution(
    State(state): State<AppState>,
    Path(cliente_id): Path<Uuid>,
    Query(params): Query<EvolucaoParams>,
) -> Result<Json<Vec<PontoSerie>>, ApiError> {
    let metrica: Metric = params.metrica.parse().map_err(ApiError::BadRequest)?;
    let clinic = state.clinic.read().await;
    clinic.get_client(cliente_id)?;
    Ok(Json(clinic.assessment_evolution(cliente_id, &metrica)))
}

pub async fn client_history(
    State(state): State<AppState>,
    Path(cliente_id): Path<Uuid>,
    Query(params): Query<HistoricoParams>,
) -> Result<Json<HistoricoAvaliacoes>, ApiError> {
    let clinic = state.clinic.read().await;
    clinic.get_client(cliente_id)?;
    Ok(Json(clinic.assessment_history(cliente_id, params.desde, params.ate)))
}
