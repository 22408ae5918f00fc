// src/api/handlers.rs

use axum::{extract::State, Json};
use log::info;
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    EnrichRequest, EnrichResponse, GraphRequest, GraphResponse, NameHit, RegionGroup, RosterSummary,
};
use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::AppState;
use crate::models::{DatasetKind, Document, Language};
use crate::sync::SyncOutcome;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    /// A dataset name, or absent/`all` for every dataset.
    pub dataset: Option<String>,
    /// A language, or absent for every configured language.
    pub language: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub collection: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachQuery {
    #[serde(default)]
    pub geographic_reach: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
}

fn parse_dataset(raw: &str) -> Result<DatasetKind, ApiError> {
    raw.parse::<DatasetKind>().map_err(ApiError::BadRequest)
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /sync?dataset=&language=
pub async fn trigger_sync(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SyncQuery>,
) -> ApiResult<Vec<SyncOutcome>> {
    let datasets = match query.dataset.as_deref().map(str::trim) {
        None | Some("") | Some("all") => DatasetKind::ALL.to_vec(),
        Some(name) => vec![parse_dataset(name)?],
    };
    let languages = match query.language {
        Some(language) => vec![language],
        None => state.engine.languages(),
    };
    if languages.is_empty() {
        return Err(ApiError::BadRequest("no spreadsheet is configured".to_string()));
    }

    info!("Manual sync requested: {:?} in {:?}", datasets, languages);
    Ok(Json(state.engine.sync_many(&datasets, &languages).await))
}

/// GET /records?collection=&language=
pub async fn list_records(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RecordsQuery>,
) -> ApiResult<Vec<Document>> {
    let kind = parse_dataset(&query.collection)?;
    Ok(Json(state.aggregator.records(kind, query.language).await?))
}

/// POST /by-categories
pub async fn by_categories(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EnrichRequest>,
) -> ApiResult<EnrichResponse> {
    Ok(Json(state.aggregator.enrich(&request).await?))
}

/// GET /search?term=
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Vec<NameHit>> {
    Ok(Json(state.aggregator.search(&query.term, query.language).await?))
}

async fn graph(state: AppState, kind: DatasetKind, request: GraphRequest) -> ApiResult<GraphResponse> {
    Ok(Json(state.aggregator.series_graph(kind, &request).await?))
}

/// POST /value/graph
pub async fn value_graph(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GraphRequest>,
) -> ApiResult<GraphResponse> {
    graph(state, DatasetKind::Value, request).await
}

/// POST /volume/graph
pub async fn volume_graph(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GraphRequest>,
) -> ApiResult<GraphResponse> {
    graph(state, DatasetKind::Volume, request).await
}

/// GET /value/all-except-total
pub async fn value_except_total(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Vec<Document>> {
    Ok(Json(state.aggregator.series_except_total(DatasetKind::Value, query.language).await?))
}

/// GET /volume/all-except-total
pub async fn volume_except_total(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Vec<Document>> {
    Ok(Json(state.aggregator.series_except_total(DatasetKind::Volume, query.language).await?))
}

/// GET /value/total
pub async fn value_total(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Option<Document>> {
    Ok(Json(state.aggregator.series_total(DatasetKind::Value, query.language).await?))
}

/// GET /volume/total
pub async fn volume_total(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Option<Document>> {
    Ok(Json(state.aggregator.series_total(DatasetKind::Volume, query.language).await?))
}

/// GET /categories/summary
pub async fn category_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<RosterSummary> {
    Ok(Json(state.aggregator.category_summary(query.language).await?))
}

/// GET /profiles/by-geographic-reach?geographicReach=
pub async fn by_geographic_reach(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReachQuery>,
) -> ApiResult<Vec<Document>> {
    Ok(Json(
        state
            .aggregator
            .by_geographic_reach(&query.geographic_reach, query.language)
            .await?,
    ))
}

/// GET /profiles/grouped-by-region
pub async fn grouped_by_region(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Vec<RegionGroup>> {
    Ok(Json(state.aggregator.grouped_by_region(query.language).await?))
}
