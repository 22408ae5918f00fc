// src/sheets/source.rs

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Rows of a tabular range, each an ordered list of cell texts. Trailing
/// empty cells may be missing, as in the Sheets values API.
pub type SheetRows = Vec<Vec<String>>;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("sheet source misconfigured: {0}")]
    Config(String),
    #[error("sheet authentication failed: {0}")]
    Auth(String),
    #[error("sheet request failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("sheet transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("range '{range}' not found in spreadsheet '{spreadsheet_id}'")]
    MissingRange {
        spreadsheet_id: String,
        range: String,
    },
}

impl SheetError {
    /// Transport failures, throttling and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SheetError::Transport(_) => true,
            SheetError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_range(&self, spreadsheet_id: &str, range: &str) -> Result<SheetRows, SheetError>;
}

/// In-process source serving fixed ranges. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct StaticSheets {
    ranges: RwLock<HashMap<(String, String), SheetRows>>,
}

impl StaticSheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_range(&self, spreadsheet_id: &str, range: &str, rows: SheetRows) {
        self.ranges
            .write()
            .await
            .insert((spreadsheet_id.to_string(), range.to_string()), rows);
    }

    /// Loads ranges from a JSON file shaped `{"<spreadsheet id>": {"<range>": [[cells]]}}`.
    pub async fn from_json(text: &str) -> anyhow::Result<Self> {
        let parsed: HashMap<String, HashMap<String, SheetRows>> = serde_json::from_str(text)?;
        let source = Self::new();
        for (spreadsheet_id, ranges) in parsed {
            for (range, rows) in ranges {
                source.set_range(&spreadsheet_id, &range, rows).await;
            }
        }
        Ok(source)
    }
}

#[async_trait]
impl SheetSource for StaticSheets {
    async fn fetch_range(&self, spreadsheet_id: &str, range: &str) -> Result<SheetRows, SheetError> {
        self.ranges
            .read()
            .await
            .get(&(spreadsheet_id.to_string(), range.to_string()))
            .cloned()
            .ok_or_else(|| SheetError::MissingRange {
                spreadsheet_id: spreadsheet_id.to_string(),
                range: range.to_string(),
            })
    }
}

/// Converts loosely typed string slices into owned rows.
pub fn rows_from<R, C>(rows: R) -> SheetRows
where
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<str>,
{
    rows.into_iter()
        .map(|row| row.into_iter().map(|c| c.as_ref().to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_sheets_serves_ranges() {
        let sheets = StaticSheets::new();
        sheets
            .set_range("sheet-1", "2025 data!A1:AZ", rows_from([vec!["System name"], vec!["PayNow"]]))
            .await;

        let rows = sheets.fetch_range("sheet-1", "2025 data!A1:AZ").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "PayNow");

        let err = sheets.fetch_range("sheet-1", "Volume data!A3:ZZ").await.unwrap_err();
        assert!(matches!(err, SheetError::MissingRange { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_static_sheets_from_json() {
        let json = r#"{"abc": {"Live IPS List!B1:ZZ": [["a", "b"], []]}}"#;
        let sheets = StaticSheets::from_json(json).await.unwrap();
        let rows = sheets.fetch_range("abc", "Live IPS List!B1:ZZ").await.unwrap();
        assert_eq!(rows, vec![vec!["a".to_string(), "b".to_string()], vec![]]);
    }

    #[test]
    fn test_retryable_statuses() {
        let throttled = SheetError::Http { status: 429, body: String::new() };
        let forbidden = SheetError::Http { status: 403, body: String::new() };
        assert!(throttled.is_retryable());
        assert!(!forbidden.is_retryable());
    }
}
