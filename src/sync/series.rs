// src/sync/series.rs
//
// Volume and value tabs: one row per system, one numeric column per year.

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::matching::EntityRef;
use crate::models::{DatasetKind, Document};
use crate::normalization::HeaderNormalizer;
use crate::sheets::SheetRows;
use crate::sync::profile::NAME_FIELD;
use crate::sync::{cell, is_blank_row, OpBatch};
use crate::utils::logging::SyncLogger;
use crate::utils::numeric::numeric_cell_value;

/// Header cleanup used for series tabs: one line, single spaces, punctuation
/// stripped (value tabs keep `(`, `)` and `$`), lower-cased.
pub fn series_header(raw: &str, kind: DatasetKind) -> String {
    let keep_symbols = kind == DatasetKind::Value;
    let kept: String = raw
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric()
                || c.is_whitespace()
                || (keep_symbols && matches!(c, '(' | ')' | '$'))
        })
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn year_column_regex(kind: DatasetKind) -> Result<Regex> {
    let pattern = match kind {
        DatasetKind::Value => r"^value\s*\(\$us\)\s*(\d{4})\s*ips transactions$",
        _ => r"^volumes\s*(\d{4})\s*ips transactions$",
    };
    Regex::new(pattern).with_context(|| format!("Invalid year column pattern for {}", kind))
}

/// Year -> column index of every per-year figure column.
pub fn detect_year_columns(cleaned_headers: &[String], kind: DatasetKind) -> Result<BTreeMap<i32, usize>> {
    let re = year_column_regex(kind)?;
    let mut years = BTreeMap::new();
    for (idx, header) in cleaned_headers.iter().enumerate() {
        if let Some(year) = re
            .captures(header)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
        {
            years.insert(year, idx);
        }
    }
    Ok(years)
}

/// Builds one upsert per named series row. Year cells become numbers or `null`.
pub fn build_series_batch(
    rows: &SheetRows,
    header_row: usize,
    kind: DatasetKind,
    headers: &HeaderNormalizer,
    logger: Option<&SyncLogger>,
) -> Result<OpBatch> {
    let mut batch = OpBatch::new();
    let prefix = kind.series_prefix().unwrap_or("volumes");
    let Some(raw_headers) = rows.get(header_row) else {
        batch.note(format!("no header row at offset {}", header_row));
        return Ok(batch);
    };

    let keys = headers.normalize_row(kind, raw_headers);
    let cleaned: Vec<String> = raw_headers.iter().map(|h| series_header(h, kind)).collect();
    let find = |key: &str| keys.iter().position(|k| k == key);

    let Some(name_idx) = find(NAME_FIELD) else {
        batch.note("no 'System name' column in header row");
        return Ok(batch);
    };
    let reach_idx = find("geographicReach");
    let type_idx = find("ipsType");
    let exchange_idx = match kind {
        DatasetKind::Value => cleaned.iter().position(|h| h.starts_with("exchange rate")),
        _ => None,
    };

    let year_columns = detect_year_columns(&cleaned, kind)?;
    if let Some(logger) = logger {
        let years: Vec<i32> = year_columns.keys().copied().collect();
        logger.log_year_columns(prefix, &years);
    }
    if year_columns.is_empty() {
        batch.note(format!("no {} year columns detected", prefix));
    }

    let text = |row: &[String], idx: Option<usize>| {
        Value::String(idx.map(|i| cell(row, i).trim().to_string()).unwrap_or_default())
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
        doc.insert(NAME_FIELD.to_string(), Value::String(entity.display.clone()));
        doc.insert("geographicReach".to_string(), text(row, reach_idx));
        doc.insert("ipsType".to_string(), text(row, type_idx));
        if kind == DatasetKind::Value {
            doc.insert("exchangeRate".to_string(), text(row, exchange_idx));
        }
        for (year, idx) in &year_columns {
            doc.insert(format!("{}{}", prefix, year), numeric_cell_value(cell(row, *idx)));
        }

        batch.push(entity.key, doc, &entity.display, logger);
    }
    Ok(batch)
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
    fn test_series_header_cleanup() {
        assert_eq!(
            series_header("Volumes 2023\nIPS  transactions", DatasetKind::Volume),
            "volumes 2023 ips transactions"
        );
        assert_eq!(
            series_header("Value ($US) 2022 IPS transactions*", DatasetKind::Value),
            "value ($us) 2022 ips transactions"
        );
        assert_eq!(
            series_header("Value ($US) 2022 IPS transactions", DatasetKind::Volume),
            "value us 2022 ips transactions"
        );
    }

    #[test]
    fn test_detect_year_columns() {
        let cleaned: Vec<String> = [
            "system name",
            "volumes 2021 ips transactions",
            "volumes2022 ips transactions",
            "volumes 2022 growth",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let years = detect_year_columns(&cleaned, DatasetKind::Volume).unwrap();
        assert_eq!(years.into_iter().collect::<Vec<_>>(), vec![(2021, 1), (2022, 2)]);
    }

    #[test]
    fn test_volume_rows() {
        let rows = rows_from([
            vec!["System name", "Geographic reach", "IPS type", "Volumes 2023 IPS transactions", "Volumes 2024 IPS transactions"],
            vec!["PesaLink", "Kenya", "Domestic", "1,234", ""],
            vec!["GIP", "Ghana", "Domestic", "n/a", "5000"],
            vec!["", "", "", "", ""],
        ]);
        let batch = build_series_batch(&rows, 0, DatasetKind::Volume, &normalizer(), None).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.skipped, 1);

        let pesalink = batch.get("pesalink").unwrap();
        assert_eq!(pesalink["volumes2023"], json!(1234));
        assert_eq!(pesalink["volumes2024"], Value::Null);
        assert_eq!(pesalink["geographicReach"], json!("Kenya"));

        let gip = batch.get("gip").unwrap();
        assert_eq!(gip["volumes2023"], Value::Null);
        assert_eq!(gip["volumes2024"], json!(5000));
    }

    #[test]
    fn test_value_rows_keep_exchange_rate() {
        let rows = rows_from([
            vec!["System name", "Geographic reach", "Exchange rate (LCU per $US)", "Value ($US) 2024 IPS transactions"],
            vec!["Total", "", "", "10,000.5"],
        ]);
        let batch = build_series_batch(&rows, 0, DatasetKind::Value, &normalizer(), None).unwrap();
        let total = batch.get("total").unwrap();
        assert_eq!(total["values2024"], json!(10000.5));
        assert_eq!(total["exchangeRate"], json!(""));
        assert_eq!(total["ipsType"], json!(""));
    }

    #[test]
    fn test_missing_name_column_yields_empty_batch() {
        let rows = rows_from([vec!["Geographic reach"], vec!["Kenya"]]);
        let batch = build_series_batch(&rows, 0, DatasetKind::Value, &normalizer(), None).unwrap();
        assert!(batch.is_empty());
        assert!(!batch.notes.is_empty());
    }
}
