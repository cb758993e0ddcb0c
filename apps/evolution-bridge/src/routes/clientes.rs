//! Rotas de clientes

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use evolution_core::{
    clinic::EstatisticasClientes,
    models::{Cliente, StatusCliente},
    Page,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{expected_version, list_query};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClienteParams {
    page: Option<usize>,
    size: Option<usize>,
    search: Option<String>,
    status: Option<StatusCliente>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: StatusCliente,
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(params): Query<ClienteParams>,
) -> Result<Json<Page<Cliente>>, ApiError> {
    let query = list_query(params.page, params.size, params.search);
    let clinic = state.clinic.read().await;
    let pagina = match params.status {
        // filtro por status sobre a mesma ordenação da listagem
        Some(status) => clinic
            .clientes()
            .list(&query, |c| c.status == status)?,
        None => clinic.list_clients(&query)?,
    };
    Ok(Json(pagina))
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(cliente): Json<Cliente>,
) -> Result<(StatusCode, Json<Cliente>), ApiError> {
    let criado = state.mutate(move |clinic| clinic.create_client(cliente)).await?;
    Ok((StatusCode::CREATED, Json(criado)))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Cliente>, ApiError> {
    let clinic = state.clinic.read().await;
    Ok(Json(clinic.get_client(id)?.clone()))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Result<Json<Cliente>, ApiError> {
    let esperada = expected_version(&headers)?;
    let atualizado = state
        .mutate(move |clinic| clinic.update_client(id, patch, esperada))
        .await?;
    Ok(Json(atualizado))
}

pub async fn set_client_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Cliente>, ApiError> {
    let atualizado = state
        .mutate(move |clinic| clinic.set_client_status(id, body.status))
        .await?;
    Ok(Json(atualizado))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.mutate(move |clinic| clinic.delete_client(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn client_stats(State(state): State<AppState>) -> Json<EstatisticasClientes> {
    Json(state.clinic.read().await.client_stats())
}
