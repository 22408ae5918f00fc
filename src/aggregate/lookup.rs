// src/aggregate/lookup.rs
//
// Reference lookups over profiles and the series collections.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::aggregate::series::is_total;
use crate::aggregate::{filter_regex, invalid, AggregateResult, Aggregator};
use crate::models::documents::str_field;
use crate::models::{DatasetKind, Document, Language};
use crate::sync::profile::NAME_FIELD;
use crate::utils::constants::MIN_SEARCH_TERM_LEN;

const REACH_FIELD: &str = "geographicReach";
const REGION_FIELD: &str = "geographicRegion";
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameHit {
    pub system_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_reach: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSystem {
    pub system_name: Option<String>,
    pub geographic_reach: Option<String>,
    pub geographic_region: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryGroup {
    pub country: String,
    pub country_code: Option<String>,
    pub total_systems: usize,
    pub data: Vec<RegionSystem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionGroup {
    pub region: String,
    pub total_countries: usize,
    pub countries: Vec<CountryGroup>,
}

fn text(doc: &Document, field: &str) -> Option<String> {
    str_field(doc, field).map(str::to_string)
}

impl Aggregator {
    /// Profiles whose system name contains `term`, case-insensitively.
    pub async fn search(&self, term: &str, language: Language) -> AggregateResult<Vec<NameHit>> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_TERM_LEN {
            return Err(invalid(format!(
                "Search term must be at least {} characters long.",
                MIN_SEARCH_TERM_LEN
            )));
        }
        let Some(pattern) = filter_regex(term) else {
            return Ok(Vec::new());
        };

        Ok(self
            .records(DatasetKind::Profile, language)
            .await?
            .iter()
            .filter_map(|doc| {
                let name = str_field(doc, NAME_FIELD)?;
                pattern.is_match(name).then(|| NameHit {
                    system_name: name.to_string(),
                    geographic_reach: text(doc, REACH_FIELD),
                })
            })
            .collect())
    }

    /// Profiles whose geographic reach equals `reach`, ignoring case.
    pub async fn by_geographic_reach(&self, reach: &str, language: Language) -> AggregateResult<Vec<Document>> {
        let reach = reach.trim();
        if reach.is_empty() {
            return Err(invalid("geographicReach is required."));
        }
        let wanted = reach.to_lowercase();
        Ok(self
            .records(DatasetKind::Profile, language)
            .await?
            .into_iter()
            .filter(|doc| {
                str_field(doc, REACH_FIELD).is_some_and(|r| r.trim().to_lowercase() == wanted)
            })
            .collect())
    }

    /// Profiles grouped by region, then by country, in first-seen order.
    pub async fn grouped_by_region(&self, language: Language) -> AggregateResult<Vec<RegionGroup>> {
        let profiles = self.records(DatasetKind::Profile, language).await?;

        let mut regions: Vec<RegionGroup> = Vec::new();
        let mut region_index: HashMap<String, usize> = HashMap::new();
        let mut country_index: HashMap<(usize, String), usize> = HashMap::new();

        for doc in &profiles {
            let region = text(doc, REGION_FIELD).unwrap_or_else(|| UNKNOWN.to_string());
            let country = text(doc, REACH_FIELD).unwrap_or_else(|| UNKNOWN.to_string());

            let r = *region_index.entry(region.clone()).or_insert_with(|| {
                regions.push(RegionGroup {
                    region,
                    total_countries: 0,
                    countries: Vec::new(),
                });
                regions.len() - 1
            });
            let group = &mut regions[r];
            let c = *country_index.entry((r, country.clone())).or_insert_with(|| {
                group.countries.push(CountryGroup {
                    country_code: self.country_code(Some(&country)),
                    country,
                    total_systems: 0,
                    data: Vec::new(),
                });
                group.countries.len() - 1
            });

            let reach = text(doc, REACH_FIELD);
            let entry = &mut group.countries[c];
            entry.data.push(RegionSystem {
                system_name: text(doc, NAME_FIELD),
                country_code: self.country_code(reach.as_deref()),
                geographic_reach: reach,
                geographic_region: text(doc, REGION_FIELD),
            });
            entry.total_systems = entry.data.len();
            group.total_countries = group.countries.len();
        }
        Ok(regions)
    }

    /// Every series record except the aggregate `Total` row, with its country code.
    pub async fn series_except_total(&self, kind: DatasetKind, language: Language) -> AggregateResult<Vec<Document>> {
        Ok(self
            .records(kind, language)
            .await?
            .into_iter()
            .filter(|doc| !str_field(doc, NAME_FIELD).is_some_and(is_total))
            .map(|doc| self.with_country_code(doc))
            .collect())
    }

    /// The aggregate `Total` row of a series collection, if synced.
    pub async fn series_total(&self, kind: DatasetKind, language: Language) -> AggregateResult<Option<Document>> {
        Ok(self
            .records(kind, language)
            .await?
            .into_iter()
            .find(|doc| str_field(doc, NAME_FIELD).is_some_and(is_total))
            .map(|doc| self.with_country_code(doc)))
    }

    fn with_country_code(&self, mut doc: Document) -> Document {
        let code = self.country_code(str_field(&doc, REACH_FIELD));
        doc.insert(
            "countryCode".to_string(),
            code.map(Value::String).unwrap_or(Value::Null),
        );
        doc
    }
}
