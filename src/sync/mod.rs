// src/sync/mod.rs
//
// Sheet rows -> keyed documents -> idempotent upserts, one pass per dataset.

pub mod engine;
pub mod inclusivity;
pub mod profile;
pub mod roster;
pub mod series;

use std::collections::HashMap;

use crate::models::Document;
use crate::store::UpsertOp;
use crate::utils::logging::SyncLogger;

pub use engine::{SyncEngine, SyncOutcome, SyncSettings};

/// Cell text at `idx`, empty when the row is short.
pub(crate) fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

pub(crate) fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Upserts collected for one pass, de-duplicated by key.
#[derive(Debug, Default)]
pub struct OpBatch {
    ops: Vec<UpsertOp>,
    index: HashMap<String, usize>,
    pub skipped: usize,
    pub duplicates: usize,
    pub notes: Vec<String>,
}

impl OpBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a document. A repeated key replaces the earlier document in place.
    pub fn push(&mut self, key: String, doc: Document, display: &str, logger: Option<&SyncLogger>) {
        match self.index.get(&key) {
            Some(&i) => {
                self.duplicates += 1;
                if let Some(logger) = logger {
                    logger.log_duplicate(&key, display);
                }
                self.ops[i].set = doc;
            }
            None => {
                self.index.insert(key.clone(), self.ops.len());
                self.ops.push(UpsertOp { key, set: doc });
            }
        }
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[UpsertOp] {
        &self.ops
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        self.index.get(key).map(|&i| &self.ops[i].set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_last_write_wins() {
        let mut batch = OpBatch::new();
        let first = json!({"systemName": "PayNow", "ipsType": "A"}).as_object().cloned().unwrap();
        let second = json!({"systemName": "PayNow ", "ipsType": "B"}).as_object().cloned().unwrap();
        batch.push("paynow".into(), first, "PayNow", None);
        batch.push("paynow".into(), second, "PayNow ", None);

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.duplicates, 1);
        assert_eq!(batch.get("paynow").unwrap()["ipsType"], json!("B"));
    }

    #[test]
    fn test_row_helpers() {
        let row = vec!["  ".to_string(), "".to_string()];
        assert!(is_blank_row(&row));
        assert!(is_blank_row(&[]));
        assert_eq!(cell(&row, 5), "");
    }
}
