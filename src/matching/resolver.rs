// src/matching/resolver.rs
//
// Cross-collection references are names. `EntityRef` carries the canonical key
// that collections are stored under; `NameResolver` turns a free-text name into
// a pool entry (exact key first, then fuzzy).

use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

use crate::matching::fuzzy::{best_match, sorted_pool, FuzzyMatch, PoolEntry};
use crate::normalization::name::canonicalize;

/// A soft reference to a named entity in another collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    pub display: String,
    pub key: String,
}

impl EntityRef {
    /// `None` when the name canonicalizes to nothing.
    pub fn new(raw: &str) -> Option<Self> {
        let key = canonicalize(raw);
        if key.is_empty() {
            None
        } else {
            Some(Self {
                display: raw.trim().to_string(),
                key,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Exact(&'a PoolEntry),
    Fuzzy(FuzzyMatch<'a>),
    Unmatched,
}

impl<'a> Resolution<'a> {
    pub fn entry(&self) -> Option<&'a PoolEntry> {
        match self {
            Resolution::Exact(entry) => Some(entry),
            Resolution::Fuzzy(m) => Some(m.entry),
            Resolution::Unmatched => None,
        }
    }

    pub fn is_fuzzy(&self) -> bool {
        matches!(self, Resolution::Fuzzy(_))
    }
}

/// Read-only name index over one collection, built once per pass or request.
#[derive(Debug, Clone)]
pub struct NameResolver {
    label: &'static str,
    pool: Vec<PoolEntry>,
    by_key: HashMap<String, usize>,
    threshold: f64,
}

impl NameResolver {
    pub fn new<'a, I>(label: &'static str, names: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let pool = sorted_pool(names);
        let by_key = pool
            .iter()
            .enumerate()
            .map(|(i, e)| (e.canonical.clone(), i))
            .collect();
        debug!(
            "Built {} name index: {} entries, threshold {:.2}",
            label,
            pool.len(),
            threshold
        );
        Self {
            label,
            pool,
            by_key,
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn resolve(&self, raw: &str) -> Resolution<'_> {
        let key = canonicalize(raw);
        if key.is_empty() {
            return Resolution::Unmatched;
        }
        if let Some(&i) = self.by_key.get(&key) {
            return Resolution::Exact(&self.pool[i]);
        }
        match best_match(&key, &self.pool, self.threshold) {
            Some(m) => {
                debug!(
                    "{} name '{}' fuzzy-resolved to '{}' ({:?})",
                    self.label, raw, m.entry.display, m.kind
                );
                Resolution::Fuzzy(m)
            }
            None => {
                warn!(
                    "{} name '{}' has no match at threshold {:.2}; flagged for review",
                    self.label, raw, self.threshold
                );
                Resolution::Unmatched
            }
        }
    }

    /// Resolves a reference to the stored key it points at.
    pub fn resolve_ref(&self, entity: &EntityRef) -> Option<&str> {
        self.resolve(&entity.key)
            .entry()
            .map(|e| e.canonical.as_str())
    }
}
