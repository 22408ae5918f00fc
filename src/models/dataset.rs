// src/models/dataset.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The independently synced datasets. Each writes its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Profile,
    Volume,
    Value,
    Roster,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Profile,
        DatasetKind::Volume,
        DatasetKind::Value,
        DatasetKind::Roster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Profile => "profile",
            DatasetKind::Volume => "volume",
            DatasetKind::Value => "value",
            DatasetKind::Roster => "roster",
        }
    }

    /// Prefix of the per-year numeric fields for the series datasets.
    pub fn series_prefix(&self) -> Option<&'static str> {
        match self {
            DatasetKind::Volume => Some("volumes"),
            DatasetKind::Value => Some("values"),
            _ => None,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "profile" | "general" | "generaldata" => Ok(DatasetKind::Profile),
            "volume" | "volumes" => Ok(DatasetKind::Volume),
            "value" | "values" => Ok(DatasetKind::Value),
            "roster" | "activity" | "ipslist" => Ok(DatasetKind::Roster),
            other => Err(format!("unknown dataset '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[serde(alias = "en")]
    English,
    #[serde(alias = "fr")]
    French,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::French];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "fr" | "french" | "francais" | "français" => Ok(Language::French),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

/// A stored collection: one dataset in one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Collection {
    pub kind: DatasetKind,
    pub language: Language,
}

impl Collection {
    pub fn new(kind: DatasetKind, language: Language) -> Self {
        Self { kind, language }
    }

    /// Storage name; secondary-language collections carry a `_fr` suffix.
    pub fn name(&self) -> String {
        match self.language {
            Language::English => self.kind.as_str().to_string(),
            Language::French => format!("{}_fr", self.kind.as_str()),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::new(DatasetKind::Profile, Language::English).name(), "profile");
        assert_eq!(Collection::new(DatasetKind::Roster, Language::French).name(), "roster_fr");
    }

    #[test]
    fn test_parse_dataset_and_language() {
        assert_eq!("Volumes".parse::<DatasetKind>(), Ok(DatasetKind::Volume));
        assert!("bogus".parse::<DatasetKind>().is_err());
        assert_eq!("FR".parse::<Language>(), Ok(Language::French));
        assert_eq!(Language::default(), Language::English);
    }

    #[test]
    fn test_language_deserializes_short_codes() {
        let lang: Language = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(lang, Language::French);
        let lang: Language = serde_json::from_str("\"english\"").unwrap();
        assert_eq!(lang, Language::English);
    }
}
