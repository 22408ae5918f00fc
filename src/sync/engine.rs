// src/sync/engine.rs

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Collection, DatasetKind, EnrichmentReport, Language, SyncReport};
use crate::normalization::HeaderNormalizer;
use crate::sheets::{SheetLayout, SheetSource};
use crate::store::{DocumentStore, WriteSummary};
use crate::sync::inclusivity::{apply_rankings, parse_ranking_rows};
use crate::sync::profile::build_profile_batch;
use crate::sync::roster::build_roster_batch;
use crate::sync::series::build_series_batch;
use crate::sync::OpBatch;
use crate::utils::config::{AppConfig, MatchThresholds};
use crate::utils::logging::SyncLogger;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub spreadsheet_ids: BTreeMap<Language, String>,
    pub layouts: BTreeMap<Language, SheetLayout>,
    pub thresholds: MatchThresholds,
    pub timeout: Duration,
}

impl SyncSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let layouts = config
            .source
            .languages()
            .into_iter()
            .map(|language| (language, SheetLayout::default()))
            .collect();
        Self {
            spreadsheet_ids: config.source.spreadsheet_ids.clone(),
            layouts,
            thresholds: config.thresholds,
            timeout: config.sync_timeout(),
        }
    }

    pub fn languages(&self) -> Vec<Language> {
        self.spreadsheet_ids.keys().copied().collect()
    }
}

/// Result of one (dataset, language) sync for callers that fan out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub dataset: DatasetKind,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

type SyncKey = (DatasetKind, Language);

pub struct SyncEngine {
    source: Arc<dyn SheetSource>,
    store: Arc<dyn DocumentStore>,
    headers: Arc<HeaderNormalizer>,
    settings: SyncSettings,
    locks: Mutex<HashMap<SyncKey, Arc<Mutex<()>>>>,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn SheetSource>,
        store: Arc<dyn DocumentStore>,
        headers: Arc<HeaderNormalizer>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            source,
            store,
            headers,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn languages(&self) -> Vec<Language> {
        self.settings.languages()
    }

    async fn lock_for(&self, key: SyncKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Runs one pass. Passes over the same (dataset, language) are serialized;
    /// each is bounded by the configured timeout.
    pub async fn sync(&self, dataset: DatasetKind, language: Language) -> Result<SyncReport> {
        let lock = self.lock_for((dataset, language)).await;
        let _guard = lock.lock().await;

        let logger = SyncLogger::new(dataset, language);
        let run_id = Uuid::new_v4().to_string();
        let outcome = tokio::time::timeout(
            self.settings.timeout,
            self.run_pass(dataset, language, &run_id, &logger),
        )
        .await;

        match outcome {
            Ok(Ok(mut report)) => {
                report.elapsed_ms = logger.elapsed_ms();
                logger.log_completion(&report);
                Ok(report)
            }
            Ok(Err(e)) => {
                logger.log_failure(&e);
                Err(e)
            }
            Err(_) => {
                let e = anyhow!(
                    "sync of {} ({}) timed out after {:?}",
                    dataset,
                    language,
                    self.settings.timeout
                );
                logger.log_failure(&e);
                Err(e)
            }
        }
    }

    /// Runs every requested pair concurrently; distinct datasets write disjoint collections.
    pub async fn sync_many(&self, datasets: &[DatasetKind], languages: &[Language]) -> Vec<SyncOutcome> {
        let pairs: Vec<SyncKey> = languages
            .iter()
            .flat_map(|l| datasets.iter().map(move |d| (*d, *l)))
            .collect();
        info!("Starting {} sync passes", pairs.len());

        let runs = pairs.into_iter().map(|(dataset, language)| async move {
            match self.sync(dataset, language).await {
                Ok(report) => SyncOutcome {
                    dataset,
                    language,
                    report: Some(report),
                    error: None,
                },
                Err(e) => SyncOutcome {
                    dataset,
                    language,
                    report: None,
                    error: Some(format!("{:#}", e)),
                },
            }
        });
        let outcomes = join_all(runs).await;

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            warn!("{} of {} sync passes failed", failed, outcomes.len());
        }
        outcomes
    }

    /// Every dataset in every configured language.
    pub async fn sync_all(&self) -> Vec<SyncOutcome> {
        self.sync_many(&DatasetKind::ALL, &self.languages()).await
    }

    async fn run_pass(
        &self,
        dataset: DatasetKind,
        language: Language,
        run_id: &str,
        logger: &SyncLogger,
    ) -> Result<SyncReport> {
        let spreadsheet_id = self
            .settings
            .spreadsheet_ids
            .get(&language)
            .ok_or_else(|| anyhow!("no spreadsheet configured for language '{}'", language))?;
        let layout = self
            .settings
            .layouts
            .get(&language)
            .cloned()
            .unwrap_or_default();
        let collection = Collection::new(dataset, language);

        let range = match dataset {
            DatasetKind::Profile => &layout.profile_range,
            DatasetKind::Volume => &layout.volume_range,
            DatasetKind::Value => &layout.value_range,
            DatasetKind::Roster => &layout.roster_range,
        };
        logger.log_start(run_id, range);

        let rows = self
            .source
            .fetch_range(spreadsheet_id, range)
            .await
            .with_context(|| format!("Failed to fetch '{}'", range))?;
        logger.log_rows_loaded(rows.len(), range);

        let header_rows = match dataset {
            DatasetKind::Profile => layout.profile_header_row + 1,
            DatasetKind::Volume | DatasetKind::Value => layout.series_header_row + 1,
            DatasetKind::Roster => 0,
        };

        let batch = match dataset {
            DatasetKind::Profile => {
                build_profile_batch(&rows, layout.profile_header_row, &self.headers, Some(logger))
            }
            DatasetKind::Volume | DatasetKind::Value => build_series_batch(
                &rows,
                layout.series_header_row,
                dataset,
                &self.headers,
                Some(logger),
            )?,
            DatasetKind::Roster => {
                build_roster_batch(&rows, &layout.roster_blocks, language, Some(logger))
            }
        };
        logger.log_rows_prepared(batch.len(), batch.skipped, batch.duplicates);

        let mut report = SyncReport::new(run_id, dataset, language);
        report.rows_read = rows.len().saturating_sub(header_rows);
        let summary = self.write_batch(collection, &batch, logger).await?;
        report.matched = summary.matched;
        report.modified = summary.modified;
        report.upserted = summary.upserted;
        report.skipped = batch.skipped;
        report.duplicates = batch.duplicates;
        report.notes = batch.notes;

        if dataset == DatasetKind::Profile {
            let inclusivity = self
                .run_inclusivity(spreadsheet_id, &layout, collection, logger)
                .await;
            report.unmatched = inclusivity.unmatched.clone();
            report.inclusivity = Some(inclusivity);
        }
        Ok(report)
    }

    async fn write_batch(
        &self,
        collection: Collection,
        batch: &OpBatch,
        logger: &SyncLogger,
    ) -> Result<WriteSummary> {
        if batch.is_empty() {
            logger.log_phase("Write", Some("nothing to upsert"));
            return Ok(WriteSummary::default());
        }
        logger.log_phase("Write", Some(&format!("{} upserts into {}", batch.len(), collection)));
        let summary = self
            .store
            .bulk_upsert(collection, batch.ops())
            .await
            .with_context(|| format!("Bulk upsert into {} failed", collection))?;
        logger.log_write(&summary);
        Ok(summary)
    }

    /// Runs after the profile upsert. Failures are folded into the report so a
    /// completed profile sync is not discarded.
    async fn run_inclusivity(
        &self,
        spreadsheet_id: &str,
        layout: &SheetLayout,
        profiles: Collection,
        logger: &SyncLogger,
    ) -> EnrichmentReport {
        let mut fallback = EnrichmentReport::default();

        let rows = match self
            .source
            .fetch_range(spreadsheet_id, &layout.inclusivity_range)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Inclusivity sheet fetch failed: {}", e);
                fallback.notes.push(format!("fetch failed: {}", e));
                return fallback;
            }
        };

        let (ranking_rows, skipped) = match parse_ranking_rows(&rows, layout.inclusivity_header_row) {
            Ok(parsed) => parsed,
            Err(note) => {
                warn!("{}", note);
                fallback.notes.push(note);
                return fallback;
            }
        };

        match apply_rankings(
            self.store.as_ref(),
            profiles,
            &ranking_rows,
            self.settings.thresholds.inclusivity_name,
            logger,
        )
        .await
        {
            Ok(mut report) => {
                report.skipped = skipped;
                info!(
                    "Inclusivity pass: {} rows, {} matched ({} fuzzy), {} modified, {} unmatched",
                    report.rows_read,
                    report.matched,
                    report.fuzzy_matches,
                    report.modified,
                    report.unmatched.len()
                );
                report
            }
            Err(e) => {
                warn!("Inclusivity pass failed: {:#}", e);
                fallback.rows_read = ranking_rows.len();
                fallback.notes.push(format!("{:#}", e));
                fallback
            }
        }
    }
}
