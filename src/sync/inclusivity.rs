// src/sync/inclusivity.rs
//
// Patch-only pass: copies the inclusivity status onto profiles that already
// exist. Rows that resolve to no stored profile are reported, never inserted.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::matching::{NameResolver, Resolution};
use crate::models::documents::str_field;
use crate::models::{Collection, Document, EnrichmentReport};
use crate::normalization::clean_header;
use crate::sheets::SheetRows;
use crate::store::DocumentStore;
use crate::sync::profile::NAME_FIELD;
use crate::sync::{cell, is_blank_row};
use crate::utils::logging::SyncLogger;

pub const RANKING_FIELD: &str = "inclusivityRanking";

/// A (name, status) pair read from the inclusivity tab.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub name: String,
    pub status: String,
}

/// Reads name/status pairs. Uses the `system name` column and the first `status`
/// column of the header row. `Err` carries a note when either column is missing.
pub fn parse_ranking_rows(
    rows: &SheetRows,
    header_row: usize,
) -> std::result::Result<(Vec<RankingRow>, usize), String> {
    let Some(headers) = rows.get(header_row) else {
        return Err(format!(
            "inclusivity sheet has {} rows; header expected at row {}",
            rows.len(),
            header_row + 1
        ));
    };
    let cleaned: Vec<String> = headers.iter().map(|h| clean_header(h)).collect();
    let name_idx = cleaned.iter().position(|h| h == "system name");
    let status_idx = cleaned.iter().position(|h| h == "status");
    let (Some(name_idx), Some(status_idx)) = (name_idx, status_idx) else {
        return Err("inclusivity sheet lacks a 'System name' or 'Status' column".to_string());
    };

    let mut parsed = Vec::new();
    let mut skipped = 0;
    for row in rows.iter().skip(header_row + 1) {
        let name = cell(row, name_idx).trim();
        if is_blank_row(row) || name.is_empty() {
            skipped += 1;
            continue;
        }
        parsed.push(RankingRow {
            name: name.to_string(),
            status: cell(row, status_idx).trim().to_string(),
        });
    }
    Ok((parsed, skipped))
}

/// Resolves each ranking row against stored profiles (exact canonical key, then
/// fuzzy at `threshold`) and patches `inclusivityRanking` on the hits.
pub async fn apply_rankings(
    store: &dyn DocumentStore,
    profiles: Collection,
    rows: &[RankingRow],
    threshold: f64,
    logger: &SyncLogger,
) -> Result<EnrichmentReport> {
    let stored = store
        .find_all(profiles)
        .await
        .with_context(|| format!("Failed to load stored profiles from {}", profiles))?;
    let names: Vec<&str> = stored
        .iter()
        .filter_map(|doc| str_field(doc, NAME_FIELD))
        .collect();
    let resolver = NameResolver::new("profile", names.iter().copied(), threshold);
    logger.log_phase(
        "Inclusivity",
        Some(&format!("{} ranking rows against {} profiles", rows.len(), resolver.len())),
    );

    let mut report = EnrichmentReport {
        rows_read: rows.len(),
        ..Default::default()
    };
    for row in rows {
        let resolution = resolver.resolve(&row.name);
        let Some(entry) = resolution.entry() else {
            logger.log_unmatched(&row.name);
            report.unmatched.push(row.name.clone());
            continue;
        };
        if let Resolution::Fuzzy(_) = resolution {
            report.fuzzy_matches += 1;
        }

        let mut fields = Document::new();
        fields.insert(RANKING_FIELD.to_string(), Value::String(row.status.clone()));
        let outcome = store
            .patch(profiles, &entry.canonical, &fields)
            .await
            .with_context(|| format!("Failed to patch inclusivity ranking for '{}'", row.name))?;
        report.matched += outcome.matched;
        report.modified += outcome.modified;
    }
    Ok(report)
}
