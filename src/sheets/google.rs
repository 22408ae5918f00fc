// src/sheets/google.rs
//
// Google Sheets v4 `values.get` client.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::sheets::auth::{ServiceAccountAuth, ServiceAccountKey, SHEETS_READONLY_SCOPE};
use crate::sheets::source::{SheetError, SheetRows, SheetSource};
use crate::utils::constants::{SHEET_FETCH_BACKOFF_MS, SHEET_FETCH_MAX_ATTEMPTS};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Clone)]
pub enum SheetCredentials {
    /// Path to a service-account key file; tokens are minted and refreshed.
    ServiceAccount(PathBuf),
    ApiKey(String),
    /// Fixed bearer token, e.g. from `gcloud auth print-access-token`.
    AccessToken(String),
    Anonymous,
}

/// Credentials resolved into something that can sign a request.
#[derive(Debug)]
enum RequestAuth {
    ServiceAccount(ServiceAccountAuth),
    ApiKey(String),
    Bearer(String),
    Anonymous,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: String,
    auth: RequestAuth,
    max_attempts: u32,
    backoff: Duration,
}

impl GoogleSheetsClient {
    pub fn new(base_url: &str, credentials: SheetCredentials) -> Result<Self, SheetError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let auth = match credentials {
            SheetCredentials::ServiceAccount(path) => {
                let key = ServiceAccountKey::from_file(&path)?;
                let auth = ServiceAccountAuth::new(key, SHEETS_READONLY_SCOPE, http.clone())?;
                debug!("Sheets requests authenticate as {}", auth.client_email());
                RequestAuth::ServiceAccount(auth)
            }
            SheetCredentials::ApiKey(key) => RequestAuth::ApiKey(key),
            SheetCredentials::AccessToken(token) => RequestAuth::Bearer(token),
            SheetCredentials::Anonymous => RequestAuth::Anonymous,
        };
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            max_attempts: SHEET_FETCH_MAX_ATTEMPTS,
            backoff: Duration::from_millis(SHEET_FETCH_BACKOFF_MS),
        })
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetError::Config(format!("invalid base URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Config(format!("base URL '{}' cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
        Ok(url)
    }

    async fn fetch_once(&self, spreadsheet_id: &str, range: &str) -> Result<SheetRows, SheetError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let mut request = self.http.get(url);
        request = match &self.auth {
            RequestAuth::ServiceAccount(auth) => request.bearer_auth(auth.access_token().await?),
            RequestAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            RequestAuth::Bearer(token) => request.bearer_auth(token),
            RequestAuth::Anonymous => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ValueRange = response.json().await?;
        Ok(payload
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

/// Cells normally arrive as formatted strings; anything else is rendered as text.
fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn fetch_range(&self, spreadsheet_id: &str, range: &str) -> Result<SheetRows, SheetError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(spreadsheet_id, range).await {
                Ok(rows) => {
                    debug!("Fetched {} rows from '{}' (attempt {})", rows.len(), range, attempt);
                    return Ok(rows);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff * 2u32.pow(attempt - 1);
                    warn!(
                        "Fetching '{}' failed (attempt {}/{}): {}. Retrying in {:?}",
                        range, attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
