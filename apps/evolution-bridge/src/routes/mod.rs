//! Tabela de rotas HTTP

mod avaliacoes;
mod clientes;
mod exames;
mod metricas;
mod protocolos;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderMap},
    routing::{get, patch, post},
    Json, Router,
};
use evolution_core::ListQuery;
use serde::Deserialize;
use serde_json::{json, Value};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Limite de corpo das requisições (anexos incluídos)
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;
const MAX_CONCURRENT_REQUESTS: usize = 256;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // clientes
        .route(
            "/clientes",
            get(clientes::list_clients).post(clientes::create_client),
        )
        .route("/clientes/stats", get(clientes::client_stats))
        .route(
            "/clientes/:id",
            get(clientes::get_client)
                .put(clientes::update_client)
                .delete(clientes::delete_client),
        )
        .route("/clientes/:id/status", patch(clientes::set_client_status))
        .route("/clientes/:id/evolucao", get(avaliacoes::client_evolution))
        .route("/clientes/:id/historico", get(avaliacoes::client_history))
        .route("/clientes/:id/exames", get(exames::client_exam_history))
        // avaliações
        .route(
            "/avaliacoes",
            get(avaliacoes::list_assessments).post(avaliacoes::create_assessment),
        )
        .route("/avaliacoes/stats", get(avaliacoes::assessment_stats))
        .route("/avaliacoes/comparativo", get(avaliacoes::compare_assessments))
        .route(
            "/avaliacoes/:id",
            get(avaliacoes::get_assessment)
                .put(avaliacoes::update_assessment)
                .delete(avaliacoes::delete_assessment),
        )
        .route("/avaliacoes/:id/relatorio", get(avaliacoes::assessment_report))
        .route("/avaliacoes/:id/fotos", post(avaliacoes::attach_photo))
        // exames
        .route("/exames", get(exames::list_exams).post(exames::create_exam))
        .route("/exames/stats", get(exames::exam_stats))
        .route("/exames/tipos", get(exames::exam_types))
        .route("/exames/laboratorios", get(exames::laboratories))
        .route("/exames/comparativo", get(exames::compare_exams))
        .route(
            "/exames/:id",
            get(exames::get_exam)
                .put(exames::update_exam)
                .delete(exames::delete_exam),
        )
        .route("/exames/:id/status", post(exames::transition_exam))
        .route("/exames/:id/relatorio", get(exames::exam_report))
        .route("/exames/:id/arquivos", post(exames::upload_attachment))
        .route(
            "/exames/:id/arquivos/:arquivo_id",
            get(exames::download_attachment),
        )
        // protocolos
        .route(
            "/protocolos",
            get(protocolos::list_protocols).post(protocolos::create_protocol),
        )
        .route("/protocolos/stats", get(protocolos::protocol_stats))
        .route(
            "/protocolos/:id",
            get(protocolos::get_protocol)
                .put(protocolos::update_protocol)
                .delete(protocolos::delete_protocol),
        )
        .route("/protocolos/:id/status", patch(protocolos::set_protocol_status))
        .route("/protocolos/:id/copia", post(protocolos::copy_protocol))
        // calculadoras
        .route("/metricas/imc", post(metricas::imc))
        .route("/metricas/gordura", post(metricas::gordura))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Parâmetros dos comparativos: `?atual=<id>&anterior=<id>`
#[derive(Debug, Deserialize)]
pub struct ComparativoParams {
    atual: Uuid,
    anterior: Uuid,
}

fn list_query(page: Option<usize>, size: Option<usize>, search: Option<String>) -> ListQuery {
    let padrao = ListQuery::default();
    ListQuery {
        page: page.unwrap_or(padrao.page),
        size: size.unwrap_or(padrao.size),
        search,
    }
}

/// Versão esperada vinda de `If-Match`. Aceita `3`, `"3"` e `W/"3"`.
fn expected_version(headers: &HeaderMap) -> Result<Option<u64>, ApiError> {
    let Some(valor) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let texto = valor
        .to_str()
        .map_err(|_| ApiError::BadRequest("Cabeçalho If-Match inválido".to_string()))?;
    texto
        .trim()
        .trim_start_matches("W/")
        .trim_matches('"')
        .parse()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Versão inválida em If-Match: {}", texto)))
}
