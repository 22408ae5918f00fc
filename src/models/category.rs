// src/models/category.rs

use crate::models::dataset::Language;
use crate::normalization::name::canonicalize;
use serde::Serialize;

/// The seven roster states. Stored documents carry the label of the sheet's language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RosterCategory {
    LiveDomestic,
    DomesticInDevelopment,
    NoDomesticActivity,
    LiveRegional,
    RegionalInDevelopment,
    PilotPhase,
    NoRegionalActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CategoryGroup {
    Domestic,
    Regional,
}

impl CategoryGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryGroup::Domestic => "Domestic",
            CategoryGroup::Regional => "Regional",
        }
    }
}

impl RosterCategory {
    pub const ALL: [RosterCategory; 7] = [
        RosterCategory::LiveDomestic,
        RosterCategory::DomesticInDevelopment,
        RosterCategory::NoDomesticActivity,
        RosterCategory::LiveRegional,
        RosterCategory::RegionalInDevelopment,
        RosterCategory::PilotPhase,
        RosterCategory::NoRegionalActivity,
    ];

    /// Stable identifier used in storage keys, independent of label language.
    pub fn as_str(&self) -> &'static str {
        match self {
            RosterCategory::LiveDomestic => "live_domestic",
            RosterCategory::DomesticInDevelopment => "domestic_in_development",
            RosterCategory::NoDomesticActivity => "no_domestic_activity",
            RosterCategory::LiveRegional => "live_regional",
            RosterCategory::RegionalInDevelopment => "regional_in_development",
            RosterCategory::PilotPhase => "pilot_phase",
            RosterCategory::NoRegionalActivity => "no_regional_activity",
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match language {
            Language::English => match self {
                RosterCategory::LiveDomestic => "LIVE: DOMESTIC IPS",
                RosterCategory::DomesticInDevelopment => "DOMESTIC: IN DEVELOPMENT",
                RosterCategory::NoDomesticActivity => "Countries with no domestic IPS activity",
                RosterCategory::LiveRegional => "LIVE: REGIONAL IPS",
                RosterCategory::RegionalInDevelopment => "REGIONAL: IN DEVELOPMENT",
                RosterCategory::PilotPhase => "IN PILOT PHASE",
                RosterCategory::NoRegionalActivity => "Countries with no regional IPS activity",
            },
            Language::French => match self {
                RosterCategory::LiveDomestic => "EN SERVICE : IPS NATIONAUX",
                RosterCategory::DomesticInDevelopment => {
                    "DOMESTIQUE : EN DÉVELOPPEMENT ( JUILLET 2024 À MARS 2025)"
                }
                RosterCategory::NoDomesticActivity => {
                    "Pays n'ayant pas d'activité IPS au niveau national"
                }
                RosterCategory::LiveRegional => "EN SERVICE: IPS RÉGIONAL",
                RosterCategory::RegionalInDevelopment => {
                    "RÉGIONAL : EN DÉVELOPPEMENT ( JUILLET 2024 À MARS 2025)"
                }
                RosterCategory::PilotPhase => "EN PHASE PILOTE",
                RosterCategory::NoRegionalActivity => {
                    "Pays n'ayant pas d'activité régionale en matière d'IPS"
                }
            },
        }
    }

    /// Short status used by the category summary.
    pub fn alias(&self) -> &'static str {
        match self {
            RosterCategory::LiveDomestic | RosterCategory::LiveRegional => "LIVE",
            RosterCategory::DomesticInDevelopment | RosterCategory::RegionalInDevelopment => {
                "IN-DEVELOPMENT"
            }
            RosterCategory::NoDomesticActivity | RosterCategory::NoRegionalActivity => {
                "NO IPS ACTIVITY"
            }
            RosterCategory::PilotPhase => "PILOT",
        }
    }

    pub fn group(&self) -> CategoryGroup {
        match self {
            RosterCategory::LiveDomestic
            | RosterCategory::DomesticInDevelopment
            | RosterCategory::NoDomesticActivity => CategoryGroup::Domestic,
            _ => CategoryGroup::Regional,
        }
    }

    /// Resolves a label in either language. Comparison ignores case, accents and spacing.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = canonicalize(label);
        if wanted.is_empty() {
            return None;
        }
        RosterCategory::ALL.into_iter().find(|category| {
            Language::ALL
                .iter()
                .any(|lang| canonicalize(category.label(*lang)) == wanted)
        })
    }
}
