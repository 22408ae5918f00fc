pub mod fuzzy;
pub mod resolver;

pub use fuzzy::{best_match, similarity, FuzzyMatch, MatchKind, PoolEntry};
pub use resolver::{EntityRef, NameResolver, Resolution};
