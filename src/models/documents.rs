// src/models/documents.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored record: field name (canonical header key) to JSON value.
pub type Document = serde_json::Map<String, Value>;

/// Reads a string field, treating absent, null and blank values alike.
pub fn str_field<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    match doc.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Typed view of an activity-roster document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub ips_name: Option<String>,
    #[serde(default)]
    pub geography: Option<String>,
    #[serde(default)]
    pub geography_countries: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub ips_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RosterEntry {
    /// Builds the view from a stored document; blank strings become `None`.
    pub fn from_document(doc: &Document) -> Self {
        let get = |field: &str| str_field(doc, field).map(|s| s.trim().to_string());
        Self {
            category: get("category").unwrap_or_default(),
            ips_name: get("ipsName"),
            geography: get("geography"),
            geography_countries: get("geographyCountries"),
            region: get("region"),
            ips_type: get("ipsType"),
            status: get("status"),
        }
    }

    /// Splits the comma-separated country list of a regional entry.
    pub fn countries(&self) -> Vec<String> {
        self.geography_countries
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roster_entry_from_document() {
        let doc = json!({
            "category": "LIVE: REGIONAL IPS",
            "ipsName": "PAPSS",
            "geographyCountries": "Ghana, Nigeria ,, Kenya",
            "region": "",
        });
        let entry = RosterEntry::from_document(doc.as_object().unwrap());
        assert_eq!(entry.ips_name.as_deref(), Some("PAPSS"));
        assert_eq!(entry.region, None);
        assert_eq!(entry.countries(), vec!["Ghana", "Nigeria", "Kenya"]);
    }
}
