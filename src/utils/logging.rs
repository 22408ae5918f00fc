// src/utils/logging.rs - Logging helpers for sync passes
use log::{info, warn};
use std::time::Instant;

use crate::models::{DatasetKind, Language, SyncReport};
use crate::store::WriteSummary;

#[derive(Clone)]
pub struct SyncLogger {
    tag: String,
    emoji: &'static str,
    start_time: Instant,
}

impl SyncLogger {
    pub fn new(dataset: DatasetKind, language: Language) -> Self {
        let emoji = match dataset {
            DatasetKind::Profile => "🏛️",
            DatasetKind::Volume => "📈",
            DatasetKind::Value => "💰",
            DatasetKind::Roster => "📋",
        };
        let tag = match language {
            Language::English => dataset.as_str().to_uppercase(),
            Language::French => format!("{}_FR", dataset.as_str().to_uppercase()),
        };
        Self {
            tag,
            emoji,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    pub fn log_start(&self, run_id: &str, range: &str) {
        info!(
            "[{}] {} 🚀 Starting sync of '{}' (run ID: {})",
            self.tag, self.emoji, range, run_id
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.tag,
                self.emoji,
                phase,
                details,
                elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.tag,
                self.emoji,
                phase,
                elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_rows_loaded(&self, count: usize, range: &str) {
        info!(
            "[{}] {} 📊 Fetched {} rows from '{}'",
            self.tag, self.emoji, count, range
        );
    }

    pub fn log_year_columns(&self, prefix: &str, years: &[i32]) {
        if years.is_empty() {
            warn!(
                "[{}] {} ⚠️  No '{}' year columns detected",
                self.tag, self.emoji, prefix
            );
        } else {
            let years: Vec<String> = years.iter().map(|y| y.to_string()).collect();
            info!(
                "[{}] {} 🗓️  Found {} columns for years: {}",
                self.tag,
                self.emoji,
                prefix,
                years.join(", ")
            );
        }
    }

    pub fn log_rows_prepared(&self, ops: usize, skipped: usize, duplicates: usize) {
        info!(
            "[{}] {} ✅ Prepared {} upserts ({} rows skipped, {} duplicate keys)",
            self.tag, self.emoji, ops, skipped, duplicates
        );
    }

    pub fn log_duplicate(&self, key: &str, display: &str) {
        warn!(
            "[{}] {} 🔁 '{}' repeats canonical key '{}'; the later row wins",
            self.tag, self.emoji, display, key
        );
    }

    pub fn log_unmatched(&self, name: &str) {
        warn!(
            "[{}] {} ❓ No stored match for '{}' - flagged for manual review",
            self.tag, self.emoji, name
        );
    }

    pub fn log_write(&self, summary: &WriteSummary) {
        info!(
            "[{}] {} 💾 Write result: {} matched, {} modified, {} upserted",
            self.tag, self.emoji, summary.matched, summary.modified, summary.upserted
        );
    }

    pub fn log_completion(&self, report: &SyncReport) {
        let elapsed = self.start_time.elapsed();
        info!(
            "[{}] {} 🏁 Sync complete in {:.2?}: {} rows read, {} upserted, {} modified, {} skipped{}",
            self.tag,
            self.emoji,
            elapsed,
            report.rows_read,
            report.upserted,
            report.modified,
            report.skipped,
            if report.is_converged() { " (no changes)" } else { "" }
        );
        for note in &report.notes {
            info!("[{}] {} 📝 {}", self.tag, self.emoji, note);
        }
    }

    pub fn log_failure(&self, error: &anyhow::Error) {
        warn!(
            "[{}] {} ❌ Sync failed after {:.2?}: {:#}",
            self.tag,
            self.emoji,
            self.start_time.elapsed(),
            error
        );
    }
}
