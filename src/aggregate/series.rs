// src/aggregate/series.rs
//
// Per-geography time series for the volume and value collections. The name
// `total` is a sentinel: alone it groups the whole collection by geography.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::aggregate::{invalid, year_range, AggregateResult, Aggregator};
use crate::models::documents::str_field;
use crate::models::{DatasetKind, Document, Language};
use crate::normalization::canonicalize;
use crate::sync::profile::NAME_FIELD;
use crate::utils::constants::{
    DEFAULT_SERIES_END_YEAR, DEFAULT_SERIES_START_YEAR, TOTAL_SENTINEL, UNKNOWN_GEOGRAPHY,
};
use crate::utils::numeric::{number_value, trailing_year, value_as_f64};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRequest {
    #[serde(default)]
    pub system_names: Vec<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRow {
    pub geographic_reach: String,
    pub country_code: Option<String>,
    pub system_names: Vec<String>,
    /// `<prefix><YEAR>` fields.
    #[serde(flatten)]
    pub years: BTreeMap<String, Value>,
}

impl SeriesRow {
    fn names_total(&self) -> bool {
        self.system_names.iter().any(|n| is_total(n))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GraphResponse {
    Rows(Vec<SeriesRow>),
    WithTotal {
        total: Option<SeriesRow>,
        data: Vec<SeriesRow>,
    },
}

pub fn is_total(name: &str) -> bool {
    canonicalize(name) == TOTAL_SENTINEL
}

/// Inclusive year window; `None` means every year.
#[derive(Debug, Clone, Copy)]
struct YearWindow(Option<(i32, i32)>);

impl YearWindow {
    fn contains(&self, year: i32) -> bool {
        match self.0 {
            Some((start, end)) => (start..=end).contains(&year),
            None => true,
        }
    }

    fn seeded(&self) -> std::ops::RangeInclusive<i32> {
        match self.0 {
            Some((start, end)) => start..=end,
            None => DEFAULT_SERIES_START_YEAR..=DEFAULT_SERIES_END_YEAR,
        }
    }
}

fn year_fields<'a>(
    doc: &'a Document,
    prefix: &'a str,
    window: YearWindow,
) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a {
    doc.iter().filter(move |(field, _)| {
        trailing_year(field, prefix).is_some_and(|year| window.contains(year))
    })
}

impl Aggregator {
    pub async fn series_graph(&self, kind: DatasetKind, request: &GraphRequest) -> AggregateResult<GraphResponse> {
        let prefix = kind
            .series_prefix()
            .ok_or_else(|| invalid(format!("{} has no yearly series", kind)))?;
        if request.system_names.is_empty() {
            return Err(invalid("systemNames must be a non-empty array."));
        }
        let window = YearWindow(year_range(request.start_year, request.end_year)?);

        let include_total = request.system_names.iter().any(|n| is_total(n));
        let wanted: HashSet<String> = request
            .system_names
            .iter()
            .map(|n| canonicalize(n))
            .filter(|n| n != TOTAL_SENTINEL)
            .collect();

        let docs = self.records(kind, request.language).await?;
        let docs: Vec<Document> = if include_total {
            docs
        } else {
            docs.into_iter()
                .filter(|doc| {
                    str_field(doc, NAME_FIELD).is_some_and(|name| wanted.contains(&canonicalize(name)))
                })
                .collect()
        };

        let rows = if include_total && wanted.is_empty() {
            self.group_by_geography(&docs, prefix, window)
        } else {
            docs.iter().map(|doc| self.project(doc, prefix, window)).collect()
        };

        if !include_total {
            return Ok(GraphResponse::Rows(rows));
        }

        let total = rows.iter().find(|row| row.names_total()).cloned();
        let data = if wanted.is_empty() {
            rows.into_iter().filter(|row| !row.names_total()).collect()
        } else {
            rows.into_iter()
                .filter(|row| row.system_names.iter().any(|n| wanted.contains(&canonicalize(n))))
                .collect()
        };
        Ok(GraphResponse::WithTotal { total, data })
    }

    fn project(&self, doc: &Document, prefix: &str, window: YearWindow) -> SeriesRow {
        let reach = str_field(doc, "geographicReach").unwrap_or_default().to_string();
        SeriesRow {
            country_code: self.country_code(Some(&reach)),
            geographic_reach: reach,
            system_names: str_field(doc, NAME_FIELD).map(str::to_string).into_iter().collect(),
            years: year_fields(doc, prefix, window)
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
        }
    }

    /// One row per geography with every year of the window seeded at zero.
    fn group_by_geography(&self, docs: &[Document], prefix: &str, window: YearWindow) -> Vec<SeriesRow> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, (Vec<String>, BTreeMap<String, f64>)> = HashMap::new();

        for doc in docs {
            let reach = str_field(doc, "geographicReach")
                .map(|r| r.trim().to_string())
                .unwrap_or_else(|| UNKNOWN_GEOGRAPHY.to_string());
            let (names, sums) = groups.entry(reach.clone()).or_insert_with(|| {
                order.push(reach.clone());
                let seeded = window
                    .seeded()
                    .map(|year| (format!("{}{}", prefix, year), 0.0))
                    .collect();
                (Vec::new(), seeded)
            });

            if let Some(name) = str_field(doc, NAME_FIELD) {
                names.push(name.to_string());
            }
            for (field, value) in year_fields(doc, prefix, window) {
                if let Some(n) = value_as_f64(Some(value)) {
                    *sums.entry(field.clone()).or_default() += n;
                }
            }
        }

        order
            .into_iter()
            .filter_map(|reach| {
                let (system_names, sums) = groups.remove(&reach)?;
                Some(SeriesRow {
                    country_code: self.country_code(Some(&reach)),
                    geographic_reach: reach,
                    system_names,
                    years: sums.into_iter().map(|(f, n)| (f, number_value(n))).collect(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_sentinel_is_case_insensitive() {
        assert!(is_total("Total"));
        assert!(is_total(" TOTAL "));
        assert!(!is_total("Totals"));
    }

    #[test]
    fn test_year_window() {
        let all = YearWindow(None);
        assert!(all.contains(1999));
        assert_eq!(all.seeded().count(), 5);

        let window = YearWindow(Some((2021, 2022)));
        assert!(window.contains(2022));
        assert!(!window.contains(2023));
    }

    #[test]
    fn test_year_fields_skip_other_columns() {
        let doc = serde_json::json!({
            "systemName": "GIP",
            "volumes2021": 5,
            "volumes2024": null,
            "volumesGrowth": 1,
        });
        let doc = doc.as_object().unwrap();
        let fields: Vec<&String> = year_fields(doc, "volumes", YearWindow(Some((2020, 2022))))
            .map(|(f, _)| f)
            .collect();
        assert_eq!(fields, vec!["volumes2021"]);
    }
}
