// src/utils/config.rs
//
// Runtime configuration, read from the environment (after `.env` loading).

use log::{info, warn};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::Language;
use crate::sheets::google::DEFAULT_SHEETS_BASE_URL;
use crate::sheets::SheetCredentials;
use crate::utils::constants::DEFAULT_ENRICHMENT_YEAR;
use crate::utils::env::non_empty_var;

/// Similarity thresholds, one per call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    /// Inclusivity sheet names against stored profile names.
    pub inclusivity_name: f64,
    /// Roster names against profile/volume/value names on the read path.
    pub roster_name: f64,
    /// Geography labels against the known country list.
    pub country: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            inclusivity_name: 0.85,
            roster_name: 0.9,
            country: 0.7,
        }
    }
}

fn threshold_var(key: &str, default: f64) -> f64 {
    match non_empty_var(key).map(|v| v.parse::<f64>()) {
        Some(Ok(t)) if (0.0..=1.0).contains(&t) => t,
        Some(_) => {
            warn!("{} must be a number in [0, 1]; using {}", key, default);
            default
        }
        None => default,
    }
}

impl MatchThresholds {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            inclusivity_name: threshold_var("MATCH_THRESHOLD_INCLUSIVITY", defaults.inclusivity_name),
            roster_name: threshold_var("MATCH_THRESHOLD_ROSTER", defaults.roster_name),
            country: threshold_var("MATCH_THRESHOLD_COUNTRY", defaults.country),
        }
    }

    pub fn log_config(&self) {
        info!(
            "🎯 Match thresholds: inclusivity={:.2}, roster={:.2}, country={:.2}",
            self.inclusivity_name, self.roster_name, self.country
        );
    }
}

/// Where the spreadsheets live and how to authenticate.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub spreadsheet_ids: BTreeMap<Language, String>,
    pub credentials: SheetCredentials,
    pub base_url: String,
}

impl SourceConfig {
    pub fn from_env() -> Self {
        let mut spreadsheet_ids = BTreeMap::new();
        if let Some(id) = non_empty_var("SHEETS_SPREADSHEET_ID") {
            spreadsheet_ids.insert(Language::English, id);
        }
        if let Some(id) = non_empty_var("SHEETS_FR_SPREADSHEET_ID") {
            spreadsheet_ids.insert(Language::French, id);
        }

        let credentials = if let Some(path) = non_empty_var("GOOGLE_APPLICATION_CREDENTIALS") {
            SheetCredentials::ServiceAccount(PathBuf::from(path))
        } else if let Some(token) = non_empty_var("SHEETS_ACCESS_TOKEN") {
            SheetCredentials::AccessToken(token)
        } else if let Some(key) = non_empty_var("SHEETS_API_KEY") {
            SheetCredentials::ApiKey(key)
        } else {
            SheetCredentials::Anonymous
        };

        Self {
            spreadsheet_ids,
            credentials,
            base_url: non_empty_var("SHEETS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SHEETS_BASE_URL.to_string()),
        }
    }

    pub fn spreadsheet_id(&self, language: Language) -> Option<&str> {
        self.spreadsheet_ids.get(&language).map(String::as_str)
    }

    pub fn languages(&self) -> Vec<Language> {
        self.spreadsheet_ids.keys().copied().collect()
    }

    pub fn log_config(&self) {
        let auth = match self.credentials {
            SheetCredentials::ServiceAccount(_) => "service account",
            SheetCredentials::ApiKey(_) => "api key",
            SheetCredentials::AccessToken(_) => "bearer token",
            SheetCredentials::Anonymous => "none",
        };
        info!("📄 Sheet source: {} (auth: {})", self.base_url, auth);
        if self.spreadsheet_ids.is_empty() {
            warn!("  ⚠️  No spreadsheet configured; set SHEETS_SPREADSHEET_ID");
        }
        for (language, id) in &self.spreadsheet_ids {
            info!("  {} -> {}", language, id);
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub source: SourceConfig,
    pub sync_interval_hours: u64,
    pub sync_timeout_secs: u64,
    pub scheduler_enabled: bool,
    pub header_map_path: Option<String>,
    pub enrichment_year: i32,
    pub thresholds: MatchThresholds,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("HTTP_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            source: SourceConfig::from_env(),
            sync_interval_hours: env::var("SYNC_INTERVAL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24)
                .max(1),
            sync_timeout_secs: env::var("SYNC_TIMEOUT_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap_or(600),
            scheduler_enabled: env::var("SYNC_SCHEDULER_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            header_map_path: non_empty_var("HEADER_MAP_PATH"),
            enrichment_year: env::var("ENRICHMENT_YEAR")
                .unwrap_or_else(|_| DEFAULT_ENRICHMENT_YEAR.to_string())
                .parse()
                .unwrap_or(DEFAULT_ENRICHMENT_YEAR),
            thresholds: MatchThresholds::from_env(),
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_hours * 3600)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    pub fn log_config(&self) {
        info!("⚙️  Service configuration:");
        info!("  HTTP bind: {}", self.bind_addr);
        info!(
            "  Scheduler: {} (every {}h, timeout {}s)",
            if self.scheduler_enabled { "enabled" } else { "disabled" },
            self.sync_interval_hours,
            self.sync_timeout_secs
        );
        info!("  Enrichment year: {}", self.enrichment_year);
        match &self.header_map_path {
            Some(path) => info!("  Header map: {}", path),
            None => info!("  Header map: embedded"),
        }
        self.source.log_config();
        self.thresholds.log_config();
    }
}
