pub mod country;

pub use country::{CelesLookup, CountryFallback, CountryIndex};
