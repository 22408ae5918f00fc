// src/aggregate/summary.rs

use serde::Serialize;

use crate::aggregate::{AggregateResult, Aggregator};
use crate::models::{CategoryGroup, DatasetKind, Language, RosterCategory, RosterEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub alias: &'static str,
    pub total: usize,
    /// Distinct system names, listed for regional categories only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ips_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: &'static str,
    pub total: usize,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub total_groups: usize,
    pub groups: Vec<GroupSummary>,
}

impl Aggregator {
    /// Roster counts per category, split into the domestic and regional groups.
    pub async fn category_summary(&self, language: Language) -> AggregateResult<RosterSummary> {
        let entries: Vec<(RosterCategory, RosterEntry)> = self
            .records(DatasetKind::Roster, language)
            .await?
            .iter()
            .map(RosterEntry::from_document)
            .filter_map(|e| RosterCategory::from_label(&e.category).map(|c| (c, e)))
            .collect();

        let groups: Vec<GroupSummary> = [CategoryGroup::Domestic, CategoryGroup::Regional]
            .into_iter()
            .map(|group| {
                let categories: Vec<CategorySummary> = RosterCategory::ALL
                    .into_iter()
                    .filter(|c| c.group() == group)
                    .map(|category| summarize(category, language, &entries))
                    .collect();
                GroupSummary {
                    group: group.as_str(),
                    total: categories.iter().map(|c| c.total).sum(),
                    categories,
                }
            })
            .collect();

        Ok(RosterSummary {
            total_groups: groups.len(),
            groups,
        })
    }
}

fn summarize(
    category: RosterCategory,
    language: Language,
    entries: &[(RosterCategory, RosterEntry)],
) -> CategorySummary {
    let members: Vec<&RosterEntry> = entries
        .iter()
        .filter(|(c, _)| *c == category)
        .map(|(_, e)| e)
        .collect();

    let ips_names = (category.group() == CategoryGroup::Regional).then(|| {
        let mut names: Vec<String> = Vec::new();
        for name in members.iter().filter_map(|e| e.ips_name.as_ref()) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    });

    CategorySummary {
        category: category.label(language).to_string(),
        alias: category.alias(),
        total: members.len(),
        ips_names,
    }
}
