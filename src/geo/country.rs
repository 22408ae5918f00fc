// src/geo/country.rs
//
// Geography label -> ISO 3166-1 alpha-2 code.
// Order: curated table, fuzzy match over the curated country list, country library.

use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::str::FromStr;

use crate::matching::fuzzy::{best_match, sorted_pool, PoolEntry};
use crate::normalization::name::canonicalize;

/// Curated labels, including alternate and historical spellings seen in the sheets.
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("Algeria", "DZ"),
    ("Angola", "AO"),
    ("Benin", "BJ"),
    ("Botswana", "BW"),
    ("Burkina Faso", "BF"),
    ("Burundi", "BI"),
    ("Cabo Verde", "CV"),
    ("Cape Verde", "CV"),
    ("Cameroon", "CM"),
    ("Central African Republic", "CF"),
    ("Chad", "TD"),
    ("Comoros", "KM"),
    ("Congo", "CG"),
    ("Republic of the Congo", "CG"),
    ("Republic of Congo", "CG"),
    ("Democratic Republic of the Congo", "CD"),
    ("Democratic Republic of Congo", "CD"),
    ("Congo, The Democratic Republic of the", "CD"),
    ("DR Congo", "CD"),
    ("DRC", "CD"),
    ("Congo-Kinshasa", "CD"),
    ("Congo-Brazzaville", "CG"),
    ("Côte d'Ivoire", "CI"),
    ("Ivory Coast", "CI"),
    ("Djibouti", "DJ"),
    ("Egypt", "EG"),
    ("Equatorial Guinea", "GQ"),
    ("Eritrea", "ER"),
    ("Eswatini", "SZ"),
    ("Swaziland", "SZ"),
    ("Ethiopia", "ET"),
    ("Gabon", "GA"),
    ("Gambia", "GM"),
    ("The Gambia", "GM"),
    ("Ghana", "GH"),
    ("Guinea", "GN"),
    ("Guinea-Bissau", "GW"),
    ("Kenya", "KE"),
    ("Lesotho", "LS"),
    ("Liberia", "LR"),
    ("Libya", "LY"),
    ("Madagascar", "MG"),
    ("Malawi", "MW"),
    ("Mali", "ML"),
    ("Mauritania", "MR"),
    ("Mauritius", "MU"),
    ("Morocco", "MA"),
    ("Mozambique", "MZ"),
    ("Namibia", "NA"),
    ("Niger", "NE"),
    ("Nigeria", "NG"),
    ("Rwanda", "RW"),
    ("Sao Tome and Principe", "ST"),
    ("São Tomé and Príncipe", "ST"),
    ("Senegal", "SN"),
    ("Seychelles", "SC"),
    ("Sierra Leone", "SL"),
    ("Somalia", "SO"),
    ("South Africa", "ZA"),
    ("South Sudan", "SS"),
    ("Sudan", "SD"),
    ("Tanzania", "TZ"),
    ("Tanzania, United Republic of", "TZ"),
    ("Togo", "TG"),
    ("Tunisia", "TN"),
    ("Uganda", "UG"),
    ("Zambia", "ZM"),
    ("Zimbabwe", "ZW"),
];

/// Canonical country list for the fuzzy step.
const KNOWN_COUNTRIES: &[&str] = &[
    "Algeria", "Angola", "Benin", "Botswana", "Burkina Faso", "Burundi",
    "Cabo Verde", "Cameroon", "Central African Republic", "Chad", "Comoros",
    "Congo", "Congo, The Democratic Republic of the", "Democratic Republic of the Congo",
    "Democratic Republic of Congo", "Côte d'Ivoire", "Djibouti",
    "Egypt", "Equatorial Guinea", "Eritrea", "Eswatini", "Ethiopia", "Gabon",
    "Gambia", "Ghana", "Guinea", "Guinea-Bissau", "Kenya", "Lesotho", "Liberia",
    "Libya", "Madagascar", "Malawi", "Mali", "Mauritania", "Mauritius", "Morocco",
    "Mozambique", "Namibia", "Niger", "Nigeria", "Rwanda", "Sao Tome and Principe",
    "Senegal", "Seychelles", "Sierra Leone", "Somalia", "South Africa", "South Sudan",
    "Sudan", "Tanzania, United Republic of", "Togo", "Tunisia", "Uganda", "Zambia", "Zimbabwe",
];

/// Last-resort lookup for labels outside the curated data.
pub trait CountryFallback: Send + Sync {
    fn lookup(&self, label: &str) -> Option<String>;
}

/// Fallback backed by the `celes` ISO 3166 tables (codes, names and aliases).
#[derive(Debug, Default, Clone, Copy)]
pub struct CelesLookup;

impl CountryFallback for CelesLookup {
    fn lookup(&self, label: &str) -> Option<String> {
        let compact: String = label.split_whitespace().collect();
        celes::Country::from_str(label)
            .or_else(|_| celes::Country::from_str(&compact))
            .ok()
            .map(|country| country.alpha2.to_string())
    }
}

static EXACT_CODES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| COUNTRY_CODES.iter().copied().collect());

static CANONICAL_CODES: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    COUNTRY_CODES
        .iter()
        .map(|(name, code)| (canonicalize(name), *code))
        .collect()
});

static COUNTRY_POOL: Lazy<Vec<PoolEntry>> = Lazy::new(|| sorted_pool(KNOWN_COUNTRIES.iter().copied()));

fn from_table(label: &str) -> Option<&'static str> {
    EXACT_CODES
        .get(label)
        .or_else(|| CANONICAL_CODES.get(&canonicalize(label)))
        .copied()
}

/// Built once at startup and shared read-only.
pub struct CountryIndex {
    threshold: f64,
    fallback: Box<dyn CountryFallback>,
}

impl CountryIndex {
    pub fn new(threshold: f64, fallback: Box<dyn CountryFallback>) -> Self {
        Self { threshold, fallback }
    }

    pub fn with_celes(threshold: f64) -> Self {
        Self::new(threshold, Box::new(CelesLookup))
    }

    /// ISO alpha-2 code for a geography label, or `None`. Never fails.
    pub fn resolve(&self, label: &str) -> Option<String> {
        let cleaned = label.trim();
        if cleaned.is_empty() {
            return None;
        }

        if let Some(code) = from_table(cleaned) {
            return Some(code.to_string());
        }

        if let Some(hit) = best_match(cleaned, &COUNTRY_POOL, self.threshold) {
            if let Some(code) = CANONICAL_CODES.get(&hit.entry.canonical) {
                debug!(
                    "Country '{}' fuzzy-resolved to '{}' ({:.2})",
                    cleaned,
                    hit.entry.display,
                    hit.score()
                );
                return Some(code.to_string());
            }
        }

        let code = self.fallback.lookup(cleaned);
        if code.is_none() {
            debug!("Country '{}' has no ISO code", cleaned);
        }
        code
    }

    pub fn resolve_opt(&self, label: Option<&str>) -> Option<String> {
        label.and_then(|l| self.resolve(l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingFallback {
        calls: Arc<AtomicUsize>,
        answer: Option<&'static str>,
    }

    impl CountryFallback for CountingFallback {
        fn lookup(&self, _label: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.map(str::to_string)
        }
    }

    fn index(answer: Option<&'static str>) -> (CountryIndex, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fallback = CountingFallback {
            calls: calls.clone(),
            answer,
        };
        (CountryIndex::new(0.7, Box::new(fallback)), calls)
    }

    #[test]
    fn test_direct_table_wins() {
        let (index, calls) = index(Some("XX"));
        assert_eq!(index.resolve("Cape Verde").as_deref(), Some("CV"));
        assert_eq!(index.resolve(" Swaziland ").as_deref(), Some("SZ"));
        assert_eq!(index.resolve("cote d’ivoire").as_deref(), Some("CI"));
        // "Niger" is also a prefix of "Nigeria"; the table entry must win.
        assert_eq!(index.resolve("Niger").as_deref(), Some("NE"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fuzzy_before_fallback() {
        let (index, calls) = index(Some("XX"));
        assert_eq!(index.resolve("Mozambiqe").as_deref(), Some("MZ"));
        assert_eq!(index.resolve("Republic of Rwanda").as_deref(), Some("RW"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_longer_country_names_beat_their_prefixes() {
        let (index, calls) = index(Some("XX"));
        let cases = [
            ("Federal Republic of Nigeria", "NG"),
            ("Republic of Niger", "NE"),
            ("Republic of Guinea-Bissau", "GW"),
            ("Republic of Guinea", "GN"),
            ("Democratic Republic of Congo", "CD"),
            ("The Democratic Republic of the Congo", "CD"),
            ("DR Congo", "CD"),
            ("Republic of Congo", "CG"),
            ("Republic of South Sudan", "SS"),
        ];
        for (label, code) in cases {
            assert_eq!(index.resolve(label).as_deref(), Some(code), "{}", label);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_then_none() {
        let (index, calls) = index(Some("FR"));
        assert_eq!(index.resolve("France").as_deref(), Some("FR"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (index, _) = index_none();
        assert_eq!(index.resolve("Atlantis"), None);
        assert_eq!(index.resolve("   "), None);
        assert_eq!(index.resolve_opt(None), None);
    }

    fn index_none() -> (CountryIndex, Arc<AtomicUsize>) {
        index(None)
    }
}
