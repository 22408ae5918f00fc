// src/models/stats_models.rs

use crate::models::dataset::{DatasetKind, Language};
use serde::Serialize;

/// Outcome of one sync pass over one (dataset, language) pair.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: String,
    pub dataset: DatasetKind,
    pub language: Language,
    pub rows_read: usize,
    /// Existing documents hit by an upsert filter.
    pub matched: u64,
    /// Matched documents whose fields actually changed.
    pub modified: u64,
    /// Documents created by this pass.
    pub upserted: u64,
    /// Rows dropped before the write: blank rows, blank names, unidentifiable roster rows.
    pub skipped: usize,
    /// Rows whose canonical key repeated an earlier row of the same pass (last one wins).
    pub duplicates: usize,
    /// Names that resolved to no stored record (inclusivity rows on a profile pass).
    pub unmatched: Vec<String>,
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusivity: Option<EnrichmentReport>,
    pub elapsed_ms: u64,
}

impl SyncReport {
    pub fn new(run_id: &str, dataset: DatasetKind, language: Language) -> Self {
        Self {
            run_id: run_id.to_string(),
            dataset,
            language,
            rows_read: 0,
            matched: 0,
            modified: 0,
            upserted: 0,
            skipped: 0,
            duplicates: 0,
            unmatched: Vec::new(),
            notes: Vec::new(),
            inclusivity: None,
            elapsed_ms: 0,
        }
    }

    /// True when the pass wrote nothing new.
    pub fn is_converged(&self) -> bool {
        self.modified == 0 && self.upserted == 0
    }
}

/// Outcome of the patch-only inclusivity pass that follows a profile sync.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentReport {
    pub rows_read: usize,
    pub matched: u64,
    pub modified: u64,
    pub fuzzy_matches: usize,
    pub skipped: usize,
    pub unmatched: Vec<String>,
    pub notes: Vec<String>,
}
