// src/bin/run_sync.rs
use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reconcile_lib::models::{DatasetKind, Language};
use reconcile_lib::normalization::HeaderNormalizer;
use reconcile_lib::sheets::{GoogleSheetsClient, SheetSource, StaticSheets};
use reconcile_lib::store::{DocumentStore, MemoryStore, PgDocumentStore};
use reconcile_lib::sync::{SyncEngine, SyncSettings};
use reconcile_lib::utils::config::AppConfig;
use reconcile_lib::utils::db_connect::{connect, ensure_schema, DbConfig};
use reconcile_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about = "Run sheet sync passes once and print the reports", long_about = None)]
struct SyncArgs {
    /// Datasets to sync (profile, volume, value, roster). All when omitted
    #[arg(short, long, value_delimiter = ',')]
    datasets: Vec<DatasetKind>,

    /// Language to sync (en, fr). Every configured language when omitted
    #[arg(short, long)]
    language: Option<Language>,

    /// Per-pass timeout in seconds, overriding SYNC_TIMEOUT_SECS
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Dry run mode (write to an in-memory store, not the database)
    #[arg(long)]
    dry_run: bool,

    /// Serve sheet ranges from a JSON fixture instead of the Sheets API
    #[arg(long)]
    fixture: Option<PathBuf>,
}

async fn sheet_source(args: &SyncArgs, config: &AppConfig) -> Result<Arc<dyn SheetSource>> {
    match &args.fixture {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read fixture {}", path.display()))?;
            let sheets = StaticSheets::from_json(&text)
                .await
                .with_context(|| format!("Fixture {} is not a range map", path.display()))?;
            info!("Serving sheet ranges from {}", path.display());
            Ok(Arc::new(sheets))
        }
        None => {
            let client = GoogleSheetsClient::new(&config.source.base_url, config.source.credentials.clone())
                .context("Failed to build sheet client")?;
            Ok(Arc::new(client))
        }
    }
}

async fn document_store(dry_run: bool) -> Result<Arc<dyn DocumentStore>> {
    if dry_run {
        warn!("Dry run: results are kept in memory and discarded on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let pool = connect(&DbConfig::from_env()).await.context("Failed to connect to database")?;
    ensure_schema(&pool)
        .await
        .context("Failed to prepare document schema")?;
    Ok(Arc::new(PgDocumentStore::new(pool)))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let args = SyncArgs::parse();
    load_env();

    let config = AppConfig::from_env();
    config.log_config();

    let mut settings = SyncSettings::from_config(&config);
    if let Some(secs) = args.timeout_secs {
        settings.timeout = Duration::from_secs(secs);
    }
    let languages = match args.language {
        Some(language) => vec![language],
        None => settings.languages(),
    };
    if languages.is_empty() {
        bail!("No spreadsheet configured; set SHEETS_SPREADSHEET_ID");
    }
    let datasets = if args.datasets.is_empty() {
        DatasetKind::ALL.to_vec()
    } else {
        args.datasets.clone()
    };

    let headers = HeaderNormalizer::load(config.header_map_path.as_deref())
        .context("Failed to load header map")?;
    headers.log_config();
    let source = sheet_source(&args, &config).await?;
    let store = document_store(args.dry_run).await?;
    let engine = SyncEngine::new(source, store, Arc::new(headers), settings);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Failed to set progress bar style")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!(
        "Syncing {} dataset(s) in {} language(s)...",
        datasets.len(),
        languages.len()
    ));

    let started = Instant::now();
    let outcomes = engine.sync_many(&datasets, &languages).await;
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    spinner.finish_with_message(format!(
        "{} passes, {} failed, {:.2?}",
        outcomes.len(),
        failed,
        started.elapsed()
    ));

    println!(
        "{}",
        serde_json::to_string_pretty(&outcomes).context("Failed to serialize sync reports")?
    );
    if failed > 0 {
        bail!("{} of {} sync passes failed", failed, outcomes.len());
    }
    Ok(())
}
