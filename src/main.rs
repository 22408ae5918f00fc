// src/main.rs
use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

use reconcile_lib::{
    aggregate::Aggregator,
    api::{build_router, AppState},
    geo::CountryIndex,
    normalization::HeaderNormalizer,
    sheets::GoogleSheetsClient,
    store::PgDocumentStore,
    sync::{SyncEngine, SyncSettings},
    utils::{
        config::AppConfig,
        db_connect::{self, DbConfig, PgPool},
        env::load_env,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    info!("Starting IPS reconciliation service");
    load_env();

    let config = AppConfig::from_env();
    config.log_config();

    let pool = db_connect::connect(&DbConfig::from_env())
        .await
        .context("Failed to connect to database")?;
    info!("Successfully connected to the database");
    db_connect::ensure_schema(&pool)
        .await
        .context("Failed to prepare document schema")?;

    let headers = HeaderNormalizer::load(config.header_map_path.as_deref())
        .context("Failed to load header map")?;
    headers.log_config();

    let source = GoogleSheetsClient::new(&config.source.base_url, config.source.credentials.clone())
        .context("Failed to build sheet client")?;
    let store = Arc::new(PgDocumentStore::new(pool.clone()));
    let settings = SyncSettings::from_config(&config);
    if let Some(layout) = settings.layouts.values().next() {
        layout.log_config();
    }

    let engine = Arc::new(SyncEngine::new(
        Arc::new(source),
        store.clone(),
        Arc::new(headers),
        settings,
    ));
    let countries = Arc::new(CountryIndex::with_celes(config.thresholds.country));
    let aggregator = Aggregator::new(store, countries, config.thresholds, config.enrichment_year);

    if config.scheduler_enabled {
        spawn_scheduler(engine.clone(), pool.clone(), &config);
    } else {
        info!("Scheduled sync disabled; use POST /sync to trigger runs");
    }

    let app = build_router(AppState::new(engine, aggregator));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🌐 Listening on {}", config.bind_addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

/// Runs every dataset on a fixed interval. The first tick fires immediately;
/// a failed run is logged and retried on the next tick.
fn spawn_scheduler(engine: Arc<SyncEngine>, pool: PgPool, config: &AppConfig) {
    let period = config.sync_interval();
    info!("⏰ Scheduling full sync every {}h", config.sync_interval_hours);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let started = Instant::now();
            info!("Scheduled sync started at {}", Utc::now().to_rfc3339());

            let outcomes = engine.sync_all().await;
            let failed: Vec<String> = outcomes
                .iter()
                .filter(|o| !o.is_ok())
                .map(|o| format!("{} ({})", o.dataset, o.language))
                .collect();
            let (connections, idle) = db_connect::get_pool_status(&pool);
            if failed.is_empty() {
                info!(
                    "Scheduled sync finished: {} passes in {:.2?} (pool: {} connections, {} idle)",
                    outcomes.len(),
                    started.elapsed(),
                    connections,
                    idle
                );
            } else {
                warn!(
                    "Scheduled sync finished with {} failures in {:.2?}: {}",
                    failed.len(),
                    started.elapsed(),
                    failed.join(", ")
                );
            }
        }
    });
}
