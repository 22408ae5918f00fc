// src/sync/profile.rs

use serde_json::Value;
use std::collections::HashMap;

use crate::matching::EntityRef;
use crate::models::{DatasetKind, Document};
use crate::normalization::HeaderNormalizer;
use crate::sheets::SheetRows;
use crate::sync::{cell, is_blank_row, OpBatch};
use crate::utils::logging::SyncLogger;

pub const NAME_FIELD: &str = "systemName";

/// Builds one upsert per named profile row, keyed by canonical system name.
/// Every mapped column is stored as trimmed text.
pub fn build_profile_batch(
    rows: &SheetRows,
    header_row: usize,
    headers: &HeaderNormalizer,
    logger: Option<&SyncLogger>,
) -> OpBatch {
    let mut batch = OpBatch::new();
    let Some(raw_headers) = rows.get(header_row) else {
        batch.note(format!("no header row at offset {}", header_row));
        return batch;
    };

    let keys = headers.normalize_row(DatasetKind::Profile, raw_headers);
    note_key_collisions(&mut batch, raw_headers, &keys);

    let Some(name_idx) = keys.iter().position(|k| k == NAME_FIELD) else {
        batch.note("no 'System name' column in header row");
        return batch;
    };

    for row in rows.iter().skip(header_row + 1) {
        if is_blank_row(row) {
            batch.skip();
            continue;
        }
        let Some(entity) = EntityRef::new(cell(row, name_idx)) else {
            batch.skip();
            continue;
        };

        let mut doc = Document::new();
        for (idx, key) in keys.iter().enumerate() {
            if key.is_empty() {
                continue;
            }
            doc.insert(key.clone(), Value::String(cell(row, idx).trim().to_string()));
        }
        doc.insert(NAME_FIELD.to_string(), Value::String(entity.display.clone()));

        batch.push(entity.key, doc, &entity.display, logger);
    }
    batch
}

/// Distinct headers that land on the same key overwrite each other; record it.
fn note_key_collisions(batch: &mut OpBatch, raw_headers: &[String], keys: &[String]) {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (raw, key) in raw_headers.iter().zip(keys) {
        if key.is_empty() {
            continue;
        }
        if let Some(previous) = seen.insert(key, raw) {
            batch.note(format!(
                "headers '{}' and '{}' both map to '{}'; the later column wins",
                previous.trim(),
                raw.trim(),
                key
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::source::rows_from;
    use serde_json::json;

    fn normalizer() -> HeaderNormalizer {
        HeaderNormalizer::embedded().unwrap()
    }

    #[test]
    fn test_profile_rows_to_documents() {
        let rows = rows_from([
            vec!["System name", "IPS type", "Year of establishment", ""],
            vec!["  PayNow  ", "Domestic", "2017"],
            vec!["", "", ""],
            vec!["", "Regional", "2020"],
            vec!["PesaLink", "Domestic", "2017", "junk"],
        ]);
        let batch = build_profile_batch(&rows, 0, &normalizer(), None);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.skipped, 2);
        let paynow = batch.get("paynow").unwrap();
        assert_eq!(paynow["systemName"], json!("PayNow"));
        assert_eq!(paynow["ipsType"], json!("Domestic"));
        assert_eq!(paynow["yearOfEstablishment"], json!("2017"));
        assert!(!paynow.contains_key(""));
    }

    #[test]
    fn test_duplicate_names_keep_last_row() {
        let rows = rows_from([
            vec!["System name", "IPS type"],
            vec!["PayNow", "Domestic"],
            vec!["paynow ", "Regional"],
        ]);
        let batch = build_profile_batch(&rows, 0, &normalizer(), None);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.duplicates, 1);
        assert_eq!(batch.get("paynow").unwrap()["systemName"], json!("paynow"));
        assert_eq!(batch.get("paynow").unwrap()["ipsType"], json!("Regional"));
    }

    #[test]
    fn test_missing_name_column() {
        let rows = rows_from([vec!["IPS type"], vec!["Domestic"]]);
        let batch = build_profile_batch(&rows, 0, &normalizer(), None);
        assert!(batch.is_empty());
        assert_eq!(batch.notes.len(), 1);

        let batch = build_profile_batch(&Vec::new(), 0, &normalizer(), None);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_header_collisions_are_noted() {
        let rows = rows_from([vec!["System name", "IPS type", "ips  TYPE"], vec!["A", "x", "y"]]);
        let batch = build_profile_batch(&rows, 0, &normalizer(), None);
        assert_eq!(batch.notes.len(), 1);
        assert_eq!(batch.get("a").unwrap()["ipsType"], json!("y"));
    }
}
