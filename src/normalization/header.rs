// src/normalization/header.rs
//
// Raw sheet header -> canonical field key. A curated table (versioned JSON
// artifact) is consulted first; anything else falls through to `camel_case`.

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::models::DatasetKind;
use crate::normalization::name::fold_diacritics;

pub const DEFAULT_HEADER_MAP: &str = include_str!("../../config/header_map.json");

#[derive(Debug, Clone, Deserialize)]
struct HeaderMapFile {
    version: u32,
    #[serde(default)]
    datasets: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Clone)]
pub struct HeaderNormalizer {
    version: u32,
    fingerprint: String,
    tables: HashMap<String, HashMap<String, String>>,
}

impl HeaderNormalizer {
    /// Parses a header map artifact. Table keys go through `clean_header`, so the
    /// file may list headers in any case or spacing.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: HeaderMapFile =
            serde_json::from_str(text).context("Failed to parse header map JSON")?;
        let tables = file
            .datasets
            .into_iter()
            .map(|(dataset, table)| {
                let cleaned = table
                    .into_iter()
                    .map(|(header, key)| (clean_header(&header), key))
                    .collect();
                (dataset.trim().to_lowercase(), cleaned)
            })
            .collect();

        let digest = Sha256::digest(text.as_bytes());
        let fingerprint = hex::encode(digest)[..12].to_string();

        Ok(Self {
            version: file.version,
            fingerprint,
            tables,
        })
    }

    /// The artifact compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(DEFAULT_HEADER_MAP)
    }

    /// Loads from `path` when given, otherwise the embedded artifact.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read header map from {}", path))?;
                Self::from_json(&text).with_context(|| format!("Invalid header map in {}", path))
            }
            None => Self::embedded(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn log_config(&self) {
        let entries: usize = self.tables.values().map(HashMap::len).sum();
        info!(
            "🗂️  Header map v{} (sha256 {}): {} datasets, {} explicit mappings",
            self.version,
            self.fingerprint,
            self.tables.len(),
            entries
        );
    }

    /// Canonical key for a raw header of `dataset`. Total: every input yields a key.
    pub fn normalize(&self, dataset: DatasetKind, raw: &str) -> String {
        let cleaned = clean_header(raw);
        if let Some(key) = self
            .tables
            .get(dataset.as_str())
            .and_then(|table| table.get(&cleaned))
        {
            return key.clone();
        }
        camel_case(&cleaned)
    }

    /// Keys for a whole header row, in column order.
    pub fn normalize_row(&self, dataset: DatasetKind, headers: &[String]) -> Vec<String> {
        headers.iter().map(|h| self.normalize(dataset, h)).collect()
    }
}

/// Lower-cases, trims and collapses every whitespace run (line breaks included).
pub fn clean_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Generic fallback key: drop accents and anything outside `[A-Za-z0-9 ]`, then
/// camel-case on whitespace boundaries (`"Year of establishment"` -> `yearOfEstablishment`).
pub fn camel_case(header: &str) -> String {
    let ascii: String = fold_diacritics(header)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    let mut key = String::with_capacity(ascii.len());
    for (i, word) in ascii.split_whitespace().enumerate() {
        let word = word.to_lowercase();
        if i == 0 {
            key.push_str(&word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            key.extend(first.to_uppercase());
            key.push_str(chars.as_str());
        }
    }
    key
}
