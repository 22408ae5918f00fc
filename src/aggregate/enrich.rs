// src/aggregate/enrich.rs

use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::aggregate::{filter_regex, invalid, year_range, AggregateResult, Aggregator, NamedDocuments};
use crate::matching::EntityRef;
use crate::models::documents::str_field;
use crate::models::{DatasetKind, Document, Language, RosterCategory, RosterEntry};
use crate::utils::numeric::{number_value, sum_fields};

/// A JSON field that may hold one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn lowercased(&self) -> HashSet<String> {
        match self {
            OneOrMany::One(s) => HashSet::from([s.to_lowercase()]),
            OneOrMany::Many(v) => v.iter().map(|s| s.to_lowercase()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichRequest {
    #[serde(default)]
    pub categories: Vec<String>,
    /// Profile field -> accepted patterns. Non-list values are ignored.
    #[serde(default)]
    pub filters: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub ips_name_filter: Option<OneOrMany>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub language: Language,
}

impl EnrichRequest {
    fn has_filters(&self) -> bool {
        self.filters.as_ref().is_some_and(|f| !f.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomesticRow {
    pub category: String,
    pub geography: String,
    pub country_code: Option<String>,
    /// `volumes<YEAR>` / `values<YEAR>` sums for every requested year.
    #[serde(flatten)]
    pub totals: BTreeMap<String, Value>,
    pub ips_names: Vec<String>,
    pub supported_use_cases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRow {
    pub category: String,
    pub geography: Option<String>,
    pub country_code: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalRow {
    pub category: String,
    pub country: String,
    pub country_code: Option<String>,
    pub ips_name: Option<String>,
    /// Absent for live regional systems, possibly null for the others.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographyRow {
    pub category: String,
    pub geography: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnrichedRow {
    Domestic(DomesticRow),
    Status(StatusRow),
    Regional(RegionalRow),
    Geography(GeographyRow),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub category: String,
    pub total: usize,
    pub data: Vec<EnrichedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichResponse {
    pub categories: Vec<String>,
    pub total_categories: usize,
    pub results: Vec<CategoryResult>,
}

/// One profile predicate: the field must match at least one pattern.
struct FieldFilter {
    field: String,
    patterns: Vec<Regex>,
}

impl FieldFilter {
    fn from_request(filters: Option<&BTreeMap<String, Value>>) -> Vec<FieldFilter> {
        let Some(filters) = filters else {
            return Vec::new();
        };
        filters
            .iter()
            .filter_map(|(field, values)| {
                let Value::Array(values) = values else {
                    debug!("Ignoring non-list filter on '{}'", field);
                    return None;
                };
                let patterns: Vec<Regex> = values
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(filter_regex)
                    .collect();
                (!patterns.is_empty()).then(|| FieldFilter {
                    field: field.clone(),
                    patterns,
                })
            })
            .collect()
    }

    fn matches(&self, doc: &Document) -> bool {
        let text = match doc.get(&self.field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => return false,
        };
        self.patterns.iter().any(|re| re.is_match(&text))
    }
}

/// Resolves request categories: defaults and the implicit live-domestic
/// category when profile filters are present.
fn requested_categories(request: &EnrichRequest) -> AggregateResult<Vec<RosterCategory>> {
    let has_filters = request.has_filters();
    let mut categories = Vec::new();
    for label in &request.categories {
        let category = RosterCategory::from_label(label)
            .ok_or_else(|| invalid(format!("Invalid category: {}", label)))?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    if categories.is_empty() {
        if !has_filters {
            return Err(invalid("Categories must be a non-empty array."));
        }
        categories.push(RosterCategory::LiveDomestic);
    } else if has_filters && !categories.contains(&RosterCategory::LiveDomestic) {
        categories.push(RosterCategory::LiveDomestic);
    }
    Ok(categories)
}

fn requested_years(request: &EnrichRequest, default_year: i32) -> AggregateResult<Vec<i32>> {
    Ok(match year_range(request.start_year, request.end_year)? {
        Some((start, end)) => (start..=end).collect(),
        None => vec![default_year],
    })
}

/// Per-geography accumulator for live domestic systems.
struct GeographyTotals {
    geography: String,
    sums: BTreeMap<String, f64>,
    ips_names: Vec<String>,
    use_cases: Vec<String>,
}

impl Aggregator {
    /// Roster view for the requested categories, joined and grouped per category kind.
    pub async fn enrich(&self, request: &EnrichRequest) -> AggregateResult<EnrichResponse> {
        let categories = requested_categories(request)?;
        let years = requested_years(request, self.year())?;
        let language = request.language;

        let roster: Vec<RosterEntry> = self
            .records(DatasetKind::Roster, language)
            .await?
            .iter()
            .map(RosterEntry::from_document)
            .collect();

        let mut results = Vec::with_capacity(categories.len());
        for category in &categories {
            let label = category.label(language).to_string();
            let entries: Vec<&RosterEntry> = roster
                .iter()
                .filter(|e| RosterCategory::from_label(&e.category) == Some(*category))
                .collect();

            let data = match category {
                RosterCategory::LiveDomestic => {
                    self.enrich_live_domestic(&label, &entries, request, &years).await?
                }
                RosterCategory::DomesticInDevelopment | RosterCategory::NoDomesticActivity => entries
                    .iter()
                    .map(|e| {
                        EnrichedRow::Status(StatusRow {
                            category: label.clone(),
                            geography: e.geography.clone(),
                            country_code: self.country_code(e.geography.as_deref()),
                            status: e.status.clone(),
                        })
                    })
                    .collect(),
                RosterCategory::NoRegionalActivity => entries
                    .iter()
                    .map(|e| {
                        EnrichedRow::Geography(GeographyRow {
                            category: label.clone(),
                            geography: e.geography.clone(),
                            country_code: self.country_code(e.geography.as_deref()),
                        })
                    })
                    .collect(),
                RosterCategory::LiveRegional
                | RosterCategory::RegionalInDevelopment
                | RosterCategory::PilotPhase => {
                    self.split_regional(*category, &label, &entries, request.ips_name_filter.as_ref())
                }
            };

            results.push(CategoryResult {
                category: label,
                total: data.len(),
                data,
            });
        }

        info!(
            "Enriched {} categories ({}) for years {:?}",
            results.len(),
            language,
            years
        );
        Ok(EnrichResponse {
            categories: results.iter().map(|r| r.category.clone()).collect(),
            total_categories: results.len(),
            results,
        })
    }

    async fn enrich_live_domestic(
        &self,
        label: &str,
        entries: &[&RosterEntry],
        request: &EnrichRequest,
        years: &[i32],
    ) -> AggregateResult<Vec<EnrichedRow>> {
        let language = request.language;
        let profiles = self.named("profile", DatasetKind::Profile, language).await?;
        let volumes = self.named("volume", DatasetKind::Volume, language).await?;
        let values = self.named("value", DatasetKind::Value, language).await?;

        let filters = FieldFilter::from_request(request.filters.as_ref());
        let allowed = allowed_profiles(&profiles, &filters);

        let volume_fields: Vec<String> = years.iter().map(|y| format!("volumes{}", y)).collect();
        let value_fields: Vec<String> = years.iter().map(|y| format!("values{}", y)).collect();

        let mut groups: Vec<GeographyTotals> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for entry in entries {
            let entity = entry.ips_name.as_deref().and_then(EntityRef::new);
            if let Some(allowed) = &allowed {
                match entity.as_ref().and_then(|e| profiles.resolve_key(e)) {
                    Some(key) if allowed.contains(key) => {}
                    _ => continue,
                }
            }

            let volume = entity.as_ref().and_then(|e| volumes.get(e));
            let value = entity.as_ref().and_then(|e| values.get(e));
            let use_case = entity
                .as_ref()
                .and_then(|e| profiles.get(e))
                .and_then(|p| str_field(p, "supportedUseCases"))
                .map(|s| s.to_string());

            let geography = entry.geography.clone().unwrap_or_default();
            let slot = *index.entry(geography.clone()).or_insert_with(|| {
                groups.push(GeographyTotals {
                    geography,
                    sums: BTreeMap::new(),
                    ips_names: Vec::new(),
                    use_cases: Vec::new(),
                });
                groups.len() - 1
            });
            let group = &mut groups[slot];

            for field in &volume_fields {
                *group.sums.entry(field.clone()).or_default() +=
                    sum_fields(volume, std::slice::from_ref(field));
            }
            for field in &value_fields {
                *group.sums.entry(field.clone()).or_default() +=
                    sum_fields(value, std::slice::from_ref(field));
            }
            if let Some(entity) = &entity {
                group.ips_names.push(entity.display.clone());
            }
            if let Some(use_case) = use_case {
                if !group.use_cases.contains(&use_case) {
                    group.use_cases.push(use_case);
                }
            }
        }

        Ok(groups
            .into_iter()
            .map(|g| {
                EnrichedRow::Domestic(DomesticRow {
                    category: label.to_string(),
                    country_code: self.country_code(Some(&g.geography)),
                    geography: g.geography,
                    totals: g
                        .sums
                        .into_iter()
                        .map(|(field, sum)| (field, number_value(sum)))
                        .collect(),
                    ips_names: g.ips_names,
                    supported_use_cases: g.use_cases,
                })
            })
            .collect())
    }

    /// One row per listed country of each regional entry.
    fn split_regional(
        &self,
        category: RosterCategory,
        label: &str,
        entries: &[&RosterEntry],
        name_filter: Option<&OneOrMany>,
    ) -> Vec<EnrichedRow> {
        let wanted = name_filter.map(OneOrMany::lowercased);
        entries
            .iter()
            .filter(|e| match (&wanted, &e.ips_name) {
                (None, _) => true,
                (Some(wanted), Some(name)) => wanted.contains(&name.to_lowercase()),
                (Some(_), None) => false,
            })
            .flat_map(|e| {
                e.countries().into_iter().map(move |country| {
                    EnrichedRow::Regional(RegionalRow {
                        category: label.to_string(),
                        country_code: self.country_code(Some(&country)),
                        country,
                        ips_name: e.ips_name.clone(),
                        region: (category != RosterCategory::LiveRegional).then(|| e.region.clone()),
                    })
                })
            })
            .collect()
    }
}

/// Canonical names of profiles passing every filter; `None` when unfiltered.
fn allowed_profiles(profiles: &NamedDocuments, filters: &[FieldFilter]) -> Option<HashSet<String>> {
    if filters.is_empty() {
        return None;
    }
    let allowed: HashSet<String> = profiles
        .iter()
        .filter(|(_, doc)| filters.iter().all(|f| f.matches(doc)))
        .map(|(key, _)| key.clone())
        .collect();
    debug!("{} profiles pass {} filters", allowed.len(), filters.len());
    Some(allowed)
}
