//! Rotas de protocolos de treino

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use evolution_core::{
    clinic::EstatisticasProtocolos,
    models::{Protocolo, StatusProtocolo, TipoProtocolo},
    Page,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::{expected_version, list_query};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProtocoloParams {
    page: Option<usize>,
    size: Option<usize>,
    search: Option<String>,
    tipo: Option<TipoProtocolo>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CopiaRequest {
    #[validate(length(min = 1, max = 120, message = "Nome deve ter entre 1 e 120 caracteres"))]
    nome: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: StatusProtocolo,
}

pub async fn list_protocols(
    State(state): State<AppState>,
    Query(params): Query<ProtocoloParams>,
) -> Result<Json<Page<Protocolo>>, ApiError> {
    let query = list_query(params.page, params.size, params.search);
    let clinic = state.clinic.read().await;
    Ok(Json(clinic.list_protocols(&query, params.tipo)?))
}

pub async fn create_protocol(
    State(state): State<AppState>,
    Json(protocolo): Json<Protocolo>,
) -> Result<(StatusCode, Json<Protocolo>), ApiError> {
    let criado = state
        .mutate(move |clinic| Ok(clinic.create_protocol(protocolo)))
        .await?;
    Ok((StatusCode::CREATED, Json(criado)))
}

pub async fn get_protocol(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Protocolo>, ApiError> {
    let clinic = state.clinic.read().await;
    Ok(Json(clinic.get_protocol(id)?.clone()))
}

pub async fn update_protocol(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Result<Json<Protocolo>, ApiError> {
    let esperada = expected_version(&headers)?;
    let atualizado = state
        .mutate(move |clinic| clinic.update_protocol(id, patch, esperada))
        .await?;
    Ok(Json(atualizado))
}

pub async fn set_protocol_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Protocolo>, ApiError> {
    let atualizado = state
        .mutate(move |clinic| clinic.set_protocol_status(id, body.status))
        .await?;
    Ok(Json(atualizado))
}

pub async fn delete_protocol(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.mutate(move |clinic| clinic.delete_protocol(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn copy_protocol(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(copia): Json<CopiaRequest>,
) -> Result<(StatusCode, Json<Protocolo>), ApiError> {
    copia.validate()?;
    let criada = state
        .mutate(move |clinic| clinic.copy_protocol(id, &copia.nome))
        .await?;
    Ok((StatusCode::CREATED, Json(criada)))
}

pub async fn protocol_stats(State(state): State<AppState>) -> Json<EstatisticasProtocolos> {
    Json(state.clinic.read().await.protocol_stats())
}
