// src/sheets/layout.rs
//
// Where each dataset lives inside a spreadsheet. Header rows sit at different
// offsets because several tabs carry title banners above the table.

use log::info;

use crate::models::RosterCategory;

/// One category block of the roster tab: an inclusive row range (0-based, relative
/// to the fetched range) and the positional field names of its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterBlock {
    pub category: RosterCategory,
    pub columns: Vec<String>,
    pub start_row: usize,
    pub end_row: usize,
}

impl RosterBlock {
    pub fn new(category: RosterCategory, columns: &[&str], start_row: usize, end_row: usize) -> Self {
        Self {
            category,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            start_row,
            end_row,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub profile_range: String,
    pub profile_header_row: usize,
    pub inclusivity_range: String,
    pub inclusivity_header_row: usize,
    pub volume_range: String,
    pub value_range: String,
    pub series_header_row: usize,
    pub roster_range: String,
    pub roster_blocks: Vec<RosterBlock>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        use RosterCategory::*;
        Self {
            profile_range: "2025 data!A1:AZ".to_string(),
            profile_header_row: 0,
            inclusivity_range: "Inclusivity Spectrum Analysis!A1:AZ".to_string(),
            inclusivity_header_row: 4,
            volume_range: "Volume data!A3:ZZ".to_string(),
            value_range: "Value data ($US 2022)!A3:ZZ".to_string(),
            series_header_row: 0,
            roster_range: "Live IPS List!B1:ZZ".to_string(),
            roster_blocks: vec![
                RosterBlock::new(LiveDomestic, &["ipsName", "geography", "region", "ipsType"], 3, 33),
                RosterBlock::new(DomesticInDevelopment, &["geography", "status"], 40, 57),
                RosterBlock::new(NoDomesticActivity, &["geography"], 60, 68),
                RosterBlock::new(LiveRegional, &["ipsName", "geographyCountries", "region", "ipsType"], 71, 73),
                RosterBlock::new(RegionalInDevelopment, &["ipsName", "geographyCountries", "region"], 75, 78),
                RosterBlock::new(PilotPhase, &["ipsName", "geographyCountries", "region"], 80, 81),
                RosterBlock::new(NoRegionalActivity, &["geography"], 83, 86),
            ],
        }
    }
}

impl SheetLayout {
    pub fn log_config(&self) {
        info!("📐 Sheet layout:");
        info!("  Profile: '{}' (header row {})", self.profile_range, self.profile_header_row);
        info!(
            "  Inclusivity: '{}' (header row {})",
            self.inclusivity_range, self.inclusivity_header_row
        );
        info!("  Volume: '{}', Value: '{}'", self.volume_range, self.value_range);
        info!(
            "  Roster: '{}' with {} category blocks",
            self.roster_range,
            self.roster_blocks.len()
        );
    }
}
