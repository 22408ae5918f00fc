// src/sync/roster.rs
//
// The activity roster is one tab holding seven category blocks at fixed row
// ranges. Columns are positional per block, so no header row is involved.

use serde_json::Value;

use crate::models::{Document, Language};
use crate::normalization::canonicalize;
use crate::sheets::{RosterBlock, SheetRows};
use crate::sync::{cell, is_blank_row, OpBatch};
use crate::utils::logging::SyncLogger;

/// Fields that identify a roster row within its category.
const IDENTITY_FIELDS: [&str; 3] = ["ipsName", "geography", "geographyCountries"];

/// Composite key: category id plus every non-empty identity field (canonicalized).
/// `None` when the row carries no identity field at all.
pub fn roster_key(category_id: &str, doc: &Document) -> Option<String> {
    let parts: Vec<String> = IDENTITY_FIELDS
        .iter()
        .filter_map(|field| {
            let value = doc.get(*field).and_then(Value::as_str).map(canonicalize)?;
            (!value.is_empty()).then(|| format!("{}={}", field, value))
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(format!("{}|{}", category_id, parts.join("|")))
    }
}

pub fn build_roster_batch(
    rows: &SheetRows,
    blocks: &[RosterBlock],
    language: Language,
    logger: Option<&SyncLogger>,
) -> OpBatch {
    let mut batch = OpBatch::new();
    let empty: Vec<String> = Vec::new();

    for block in blocks {
        let label = block.category.label(language);
        let mut block_rows = 0usize;
        for row_idx in block.start_row..=block.end_row {
            let row = rows.get(row_idx).unwrap_or(&empty);
            if is_blank_row(row) {
                batch.skip();
                continue;
            }

            let mut doc = Document::new();
            doc.insert("category".to_string(), Value::String(label.to_string()));
            for (idx, column) in block.columns.iter().enumerate() {
                doc.insert(column.clone(), Value::String(cell(row, idx).trim().to_string()));
            }

            let Some(key) = roster_key(block.category.as_str(), &doc) else {
                batch.skip();
                batch.note(format!(
                    "row {} in '{}' has no name or geography; skipped",
                    row_idx + 1,
                    label
                ));
                continue;
            };
            let display = format!("{} / row {}", label, row_idx + 1);
            batch.push(key, doc, &display, logger);
            block_rows += 1;
        }
        if let Some(logger) = logger {
            logger.log_phase("Block parsed", Some(&format!("'{}': {} rows", label, block_rows)));
        }
    }
    batch
}
