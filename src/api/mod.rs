// src/api/mod.rs
//
// HTTP surface: manual sync trigger plus the read-side views.

pub mod error;
pub mod extract;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::aggregate::Aggregator;
use crate::sync::SyncEngine;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn new(engine: Arc<SyncEngine>, aggregator: Aggregator) -> Self {
        Self { engine, aggregator }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/sync", post(handlers::trigger_sync))
        .route("/records", get(handlers::list_records))
        .route("/by-categories", post(handlers::by_categories))
        .route("/search", get(handlers::search))
        .route("/categories/summary", get(handlers::category_summary))
        .route("/profiles/by-geographic-reach", get(handlers::by_geographic_reach))
        .route("/profiles/grouped-by-region", get(handlers::grouped_by_region))
        .route("/value/graph", post(handlers::value_graph))
        .route("/volume/graph", post(handlers::volume_graph))
        .route("/value/all-except-total", get(handlers::value_except_total))
        .route("/volume/all-except-total", get(handlers::volume_except_total))
        .route("/value/total", get(handlers::value_total))
        .route("/volume/total", get(handlers::volume_total))
        .with_state(state)
}
