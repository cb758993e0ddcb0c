//! Rotas de exames, catálogo e anexos

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use evolution_core::{
    attachments::{open_attachment, seal_attachment},
    clinic::{EstatisticasExames, RelatorioExame},
    comparison::ComparativoExames,
    models::{Exame, Laboratorio, StatusExame, TipoArquivo, TipoExame},
    DomainError, ExamFilter, Page,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{expected_version, list_query};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExameParams {
    page: Option<usize>,
    size: Option<usize>,
    search: Option<String>,
    cliente_id: Option<Uuid>,
    status: Option<StatusExame>,
    categoria: Option<String>,
    desde: Option<NaiveDate>,
    ate: Option<NaiveDate>,
}

impl From<ExameParams> for ExamFilter {
    fn from(params: ExameParams) -> Self {
        ExamFilter {
            query: list_query(params.page, params.size, params.search),
            cliente_id: params.cliente_id,
            status: params.status,
            categoria: params.categoria,
            desde: params.desde,
            ate: params.ate,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ComparativoExameParams {
    atual: Uuid,
    anterior: Uuid,
    /// Inclui a leitura clínica por direção favorável
    #[serde(default)]
    clinico: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoricoExameParams {
    tipo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransicaoBody {
    status: StatusExame,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ArquivoParams {
    #[validate(length(min = 1, max = 255, message = "Nome de arquivo inválido"))]
    nome: String,
}

pub async fn list_exams(
    State(state): State<AppState>,
    Query(params): Query<ExameParams>,
) -> Result<Json<Page<Exame>>, ApiError> {
    let filtro = ExamFilter::from(params);
    Ok(Json(state.clinic.read().await.list_exams(&filtro)?))
}

pub async fn create_exam(
    State(state): State<AppState>,
    Json(exame): Json<Exame>,
) -> Result<(StatusCode, Json<Exame>), ApiError> {
    let criado = state.mutate(move |clinic| clinic.create_exam(exame)).await?;
    Ok((StatusCode::CREATED, Json(criado)))
}

pub async fn get_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Exame>, ApiError> {
    let clinic = state.clinic.read().await;
    Ok(Json(clinic.get_exam(id)?.clone()))
}

pub async fn update_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Result<Json<Exame>, ApiError> {
    let esperada = expected_version(&headers)?;
    let atualizado = state
        .mutate(move |clinic| clinic.update_exam(id, patch, esperada))
        .await?;
    Ok(Json(atualizado))
}

pub async fn transition_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<TransicaoBody>,
) -> Result<Json<Exame>, ApiError> {
    let esperada = expected_version(&headers)?;
    let atualizado = state
        .mutate(move |clinic| clinic.transition_exam(id, body.status, esperada))
        .await?;
    Ok(Json(atualizado))
}

pub async fn delete_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.mutate(move |clinic| clinic.delete_exam(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn compare_exams(
    State(state): State<AppState>,
    Query(params): Query<ComparativoExameParams>,
) -> Result<Json<ComparativoExames>, ApiError> {
    let clinic = state.clinic.read().await;
    let comparativo = if params.clinico {
        clinic.compare_exams_clinically(params.atual, params.anterior)?
    } else {
        clinic.compare_exams(params.atual, params.anterior)?
    };
    Ok(Json(comparativo))
}

pub async fn exam_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RelatorioExame>, ApiError> {
    Ok(Json(state.clinic.read().await.exam_report(id)?))
}

pub async fn exam_types(State(state): State<AppState>) -> Json<Vec<TipoExame>> {
    Json(state.clinic.read().await.exam_types().to_vec())
}

pub async fn laboratories(State(state): State<AppState>) -> Json<Vec<Laboratorio>> {
    Json(state.clinic.read().await.laboratories().to_vec())
}

pub async fn exam_stats(State(state): State<AppState>) -> Json<EstatisticasExames> {
    Json(state.clinic.read().await.exam_stats())
}

/// Exames concluídos do cliente, do mais recente ao mais antigo
pub async fn client_exam_history(
    State(state): State<AppState>,
    Path(cliente_id): Path<Uuid>,
    Query(params): Query<HistoricoExameParams>,
) -> Result<Json<Vec<Exame>>, ApiError> {
    let clinic = state.clinic.read().await;
    clinic.get_client(cliente_id)?;
    let historico = clinic
        .exam_history(cliente_id, params.tipo.as_deref())
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(historico))
}

/// Recebe o conteúdo bruto do arquivo e o anexa ao exame
pub async fn upload_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ArquivoParams>,
    corpo: Bytes,
) -> Result<(StatusCode, Json<Exame>), ApiError> {
    params.validate()?;
    if corpo.is_empty() {
        return Err(ApiError::BadRequest("Arquivo vazio".to_string()));
    }
    state.clinic.read().await.get_exam(id)?;

    let preparado = seal_attachment(id, &params.nome, &corpo, state.data_key.as_deref())?;
    let arquivo = preparado.arquivo.clone();
    let atualizado = state
        .mutate_with_attachment(id, &preparado, move |clinic| clinic.add_attachment(id, arquivo))
        .await?;
    info!(
        "Anexo {} recebido para o exame {} ({} bytes, criptografado: {})",
        preparado.arquivo.id, id, preparado.arquivo.tamanho, preparado.arquivo.criptografado
    );
    Ok((StatusCode::CREATED, Json(atualizado)))
}

pub async fn download_attachment(
    State(state): State<AppState>,
    Path((id, arquivo_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let arquivo = {
        let clinic = state.clinic.read().await;
        clinic
            .get_exam(id)?
            .arquivos
            .iter()
            .find(|a| a.id == arquivo_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Arquivo", arquivo_id))?
    };

    let conteudo = state.store.load_attachment_content(arquivo_id).await?;
    let bytes = open_attachment(&arquivo, &conteudo, state.data_key.as_deref())?;
    let mime = match arquivo.tipo {
        TipoArquivo::Pdf => "application/pdf",
        _ => "application/octet-stream",
    };
    Ok(([(header::CONTENT_TYPE, mime)], bytes))
}
