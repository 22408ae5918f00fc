// src/aggregate/mod.rs
//
// Read side. Joins the roster with the profile, volume and value collections
// by resolved name and shapes the results served over HTTP.

pub mod enrich;
pub mod lookup;
pub mod series;
pub mod summary;

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::geo::CountryIndex;
use crate::matching::{EntityRef, NameResolver};
use crate::models::documents::str_field;
use crate::models::{Collection, DatasetKind, Document, Language};
use crate::normalization::canonicalize;
use crate::store::{DocumentStore, StoreError};
use crate::sync::profile::NAME_FIELD;
use crate::utils::config::MatchThresholds;
use crate::utils::constants::{MAX_REQUEST_YEAR, MIN_REQUEST_YEAR};

pub use enrich::{CategoryResult, EnrichRequest, EnrichResponse, EnrichedRow};
pub use lookup::{NameHit, RegionGroup};
pub use series::{GraphRequest, GraphResponse, SeriesRow};
pub use summary::{CategorySummary, GroupSummary, RosterSummary};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AggregateResult<T> = Result<T, AggregateError>;

pub(crate) fn invalid(message: impl Into<String>) -> AggregateError {
    AggregateError::InvalidRequest(message.into())
}

/// Validates a client year range. Both bounds or neither; each within
/// `MIN_REQUEST_YEAR..=MAX_REQUEST_YEAR` and `start <= end`.
pub(crate) fn year_range(start: Option<i32>, end: Option<i32>) -> AggregateResult<Option<(i32, i32)>> {
    let (start, end) = match (start, end) {
        (None, None) => return Ok(None),
        (Some(start), Some(end)) => (start, end),
        _ => return Err(invalid("startYear and endYear must be given together.")),
    };
    let allowed = MIN_REQUEST_YEAR..=MAX_REQUEST_YEAR;
    if !allowed.contains(&start) || !allowed.contains(&end) {
        return Err(invalid(format!(
            "startYear and endYear must be between {} and {}.",
            MIN_REQUEST_YEAR, MAX_REQUEST_YEAR
        )));
    }
    if start > end {
        return Err(invalid("startYear cannot be greater than endYear."));
    }
    Ok(Some((start, end)))
}

/// Case-insensitive pattern from user input. Input that is not a valid regex
/// is matched literally; `None` only if even the literal exceeds regex limits.
pub fn filter_regex(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
        })
        .ok()
}

/// Documents of one collection indexed by canonical system name, with a
/// resolver over the same names for fuzzy joins.
pub(crate) struct NamedDocuments {
    docs: HashMap<String, Document>,
    resolver: NameResolver,
}

impl NamedDocuments {
    pub(crate) fn new(label: &'static str, docs: Vec<Document>, threshold: f64) -> Self {
        let docs: HashMap<String, Document> = docs
            .into_iter()
            .filter_map(|doc| {
                let key = canonicalize(str_field(&doc, NAME_FIELD)?);
                Some((key, doc))
            })
            .collect();
        let resolver = NameResolver::new(label, docs.keys().map(String::as_str), threshold);
        Self { docs, resolver }
    }

    /// The stored key a reference points at, exact or fuzzy.
    pub(crate) fn resolve_key(&self, entity: &EntityRef) -> Option<&str> {
        self.resolver.resolve_ref(entity)
    }

    pub(crate) fn get(&self, entity: &EntityRef) -> Option<&Document> {
        self.resolve_key(entity).and_then(|key| self.docs.get(key))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Document)> {
        self.docs.iter()
    }
}

/// Shared, read-only query service. Cheap to clone.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn DocumentStore>,
    countries: Arc<CountryIndex>,
    thresholds: MatchThresholds,
    year: i32,
}

impl Aggregator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        countries: Arc<CountryIndex>,
        thresholds: MatchThresholds,
        year: i32,
    ) -> Self {
        Self {
            store,
            countries,
            thresholds,
            year,
        }
    }

    /// Year summed by enrichment when the request names no range.
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn country_code(&self, label: Option<&str>) -> Option<String> {
        self.countries.resolve_opt(label)
    }

    /// Every stored document of a collection, in key order.
    pub async fn records(&self, kind: DatasetKind, language: Language) -> AggregateResult<Vec<Document>> {
        Ok(self.store.find_all(Collection::new(kind, language)).await?)
    }

    pub(crate) async fn named(
        &self,
        label: &'static str,
        kind: DatasetKind,
        language: Language,
    ) -> AggregateResult<NamedDocuments> {
        let docs = self.records(kind, language).await?;
        Ok(NamedDocuments::new(label, docs, self.thresholds.roster_name))
    }
}
