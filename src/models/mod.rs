pub mod category;
pub mod dataset;
pub mod documents;
pub mod stats_models;

pub use category::{CategoryGroup, RosterCategory};
pub use dataset::{Collection, DatasetKind, Language};
pub use documents::{Document, RosterEntry};
pub use stats_models::{EnrichmentReport, SyncReport};
