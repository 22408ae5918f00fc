// src/matching/fuzzy.rs

use strsim::normalized_levenshtein;

use crate::normalization::name::canonicalize;
use crate::utils::constants::MIN_CONTAINMENT_LEN;

/// A candidate in a match pool: the canonical form used for comparison and
/// the display name it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolEntry {
    pub canonical: String,
    pub display: String,
}

impl PoolEntry {
    pub fn new(display: &str) -> Self {
        Self {
            canonical: canonicalize(display),
            display: display.trim().to_string(),
        }
    }
}

/// Builds a deterministic pool: blank names dropped, sorted by canonical form
/// then display name, duplicate canonical forms collapsed to the first.
pub fn sorted_pool<'a, I>(names: I) -> Vec<PoolEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut pool: Vec<PoolEntry> = names
        .into_iter()
        .map(PoolEntry::new)
        .filter(|e| !e.canonical.is_empty())
        .collect();
    pool.sort();
    pool.dedup_by(|b, a| a.canonical == b.canonical);
    pool
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Exact,
    Containment,
    Similarity(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch<'a> {
    pub entry: &'a PoolEntry,
    pub kind: MatchKind,
}

impl FuzzyMatch<'_> {
    pub fn score(&self) -> f64 {
        match self.kind {
            MatchKind::Exact | MatchKind::Containment => 1.0,
            MatchKind::Similarity(s) => s,
        }
    }
}

/// `1 - levenshtein(a, b) / max(len(a), len(b))`, over chars.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

fn contains_either(a: &str, b: &str) -> bool {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    short.chars().count() >= MIN_CONTAINMENT_LEN && long.contains(short)
}

/// Resolves `candidate` against `pool`.
///
/// Passes, first hit wins: equal canonical forms, then substring containment
/// either way (the most similar contained entry), then the highest normalized Levenshtein similarity at or above
/// `threshold`. Ties go to the earliest entry, so callers should pass a sorted pool.
/// Returns `None` when nothing qualifies; that is an expected outcome, not an error.
pub fn best_match<'a>(
    candidate: &str,
    pool: &'a [PoolEntry],
    threshold: f64,
) -> Option<FuzzyMatch<'a>> {
    let wanted = canonicalize(candidate);
    if wanted.is_empty() {
        return None;
    }

    if let Some(entry) = pool.iter().find(|e| e.canonical == wanted) {
        return Some(FuzzyMatch {
            entry,
            kind: MatchKind::Exact,
        });
    }

    // Several entries can pass containment ("niger" and "nigeria"); the one
    // closest to the whole candidate wins, earliest entry on equal scores.
    let mut contained: Option<(&PoolEntry, f64)> = None;
    for entry in pool
        .iter()
        .filter(|e| !e.canonical.is_empty() && contains_either(&wanted, &e.canonical))
    {
        let score = similarity(&wanted, &entry.canonical);
        match contained {
            Some((_, best_score)) if score <= best_score => {}
            _ => contained = Some((entry, score)),
        }
    }
    if let Some((entry, _)) = contained {
        return Some(FuzzyMatch {
            entry,
            kind: MatchKind::Containment,
        });
    }

    let mut best: Option<(&PoolEntry, f64)> = None;
    for entry in pool {
        let score = similarity(&wanted, &entry.canonical);
        if score < threshold {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((entry, score)),
        }
    }

    best.map(|(entry, score)| FuzzyMatch {
        entry,
        kind: MatchKind::Similarity(score),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<PoolEntry> {
        sorted_pool([
            "GhIPSS Instant Pay",
            "PesaLink",
            "NIBSS Instant Payment",
            "eSwitch",
            "Kenya PesaLink", // same words, longer
            "",
        ])
    }

    #[test]
    fn test_exact_after_canonicalization() {
        let pool = pool();
        let hit = best_match("  pesalink ", &pool, 0.99).unwrap();
        assert_eq!(hit.entry.display, "PesaLink");
        assert_eq!(hit.kind, MatchKind::Exact);
    }

    #[test]
    fn test_containment_fast_path() {
        let pool = pool();
        let hit = best_match("GhIPSS Instant Pay (GIP)", &pool, 0.99).unwrap();
        assert_eq!(hit.entry.display, "GhIPSS Instant Pay");
        assert_eq!(hit.kind, MatchKind::Containment);
    }

    #[test]
    fn test_containment_prefers_closest_entry() {
        let pool = sorted_pool(["Guinea", "Guinea-Bissau", "Niger", "Nigeria"]);
        let hit = best_match("Federal Republic of Nigeria", &pool, 0.99).unwrap();
        assert_eq!(hit.entry.display, "Nigeria");
        assert_eq!(hit.kind, MatchKind::Containment);
        let hit = best_match("Republic of Guinea-Bissau", &pool, 0.99).unwrap();
        assert_eq!(hit.entry.display, "Guinea-Bissau");
        // Candidate inside several entries: the shortest container is closest.
        let bissau_pool = sorted_pool(["Guinea-Bissau", "Republic of Guinea-Bissau"]);
        let hit = best_match("Bissau", &bissau_pool, 0.99).unwrap();
        assert_eq!(hit.entry.display, "Guinea-Bissau");
    }

    #[test]
    fn test_short_names_do_not_use_containment() {
        let pool = sorted_pool(["Central African Republic"]);
        assert!(best_match("fr", &pool, 0.7).is_none());
    }

    #[test]
    fn test_similarity_threshold() {
        let pool = pool();
        let hit = best_match("NIBSS Instant Paymnt", &pool, 0.9).unwrap();
        assert_eq!(hit.entry.display, "NIBSS Instant Payment");
        assert!(matches!(hit.kind, MatchKind::Similarity(s) if s >= 0.9));

        assert!(best_match("Totally unrelated", &pool, 0.9).is_none());
        assert!(best_match("", &pool, 0.0).is_none());
    }

    #[test]
    fn test_monotonic_in_threshold() {
        let pool = pool();
        let candidates = ["eswitsh", "NIBS Instant Pay", "pesa link", "ghips instant", "xyz"];
        let thresholds = [0.0, 0.3, 0.5, 0.7, 0.85, 0.9, 0.95, 1.0];
        for candidate in candidates {
            for (i, &t2) in thresholds.iter().enumerate() {
                for &t1 in &thresholds[..=i] {
                    if best_match(candidate, &pool, t2).is_some() {
                        assert!(
                            best_match(candidate, &pool, t1).is_some(),
                            "{} matched at {} but not at {}",
                            candidate,
                            t2,
                            t1
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_ties_resolve_to_first_sorted_entry() {
        let pool = sorted_pool(["abcx", "abcy"]);
        let hit = best_match("abcz", &pool, 0.5).unwrap();
        assert_eq!(hit.entry.display, "abcx");
    }

    #[test]
    fn test_sorted_pool_dedups_canonical_forms() {
        let pool = sorted_pool(["PayNow", "  paynow", "Zeta"]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].canonical, "paynow");
    }
}
