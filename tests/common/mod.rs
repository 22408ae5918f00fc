// tests/common/mod.rs
//
// Fixture spreadsheet laid out like the production sheets (default layout).
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reconcile_lib::aggregate::Aggregator;
use reconcile_lib::geo::CountryIndex;
use reconcile_lib::models::Language;
use reconcile_lib::normalization::HeaderNormalizer;
use reconcile_lib::sheets::source::rows_from;
use reconcile_lib::sheets::{SheetLayout, SheetRows, StaticSheets};
use reconcile_lib::store::MemoryStore;
use reconcile_lib::sync::{SyncEngine, SyncSettings};
use reconcile_lib::utils::config::MatchThresholds;

pub const SHEET_ID: &str = "fixture-en";

pub fn profile_rows() -> SheetRows {
    rows_from([
        vec![
            "System name",
            "IPS type",
            "Governance typology (industry, PPP, central bank led)",
            "Geographic reach",
            "Geographic region",
            "Supported use cases",
        ],
        vec!["PesaLink", "Domestic", "Industry", "Kenya", "East Africa", "P2P"],
        vec!["GIP", "Domestic", "Central Bank led", "Ghana", "West Africa", "P2B"],
        vec!["", "", "", "", "", ""],
        vec!["NIP", "Domestic", "Central bank", "Nigeria", "West Africa", "P2P"],
        vec!["  PayNow  ", "Domestic", "Central Bank", "Ghana", "West Africa", "Bulk"],
        vec!["PayNow", "Domestic", "Central Bank", "Ghana", "West Africa", "Bulk"],
    ])
}

pub fn inclusivity_rows() -> SheetRows {
    rows_from([
        vec!["Inclusivity Spectrum Analysis"],
        vec![],
        vec!["Legend: see methodology"],
        vec![],
        vec!["System name", "Status"],
        vec!["Pesa Link", "Advanced"],
        vec!["GIP", "Initial"],
        vec!["Unknown Switch", "Basic"],
    ])
}

pub fn volume_rows() -> SheetRows {
    rows_from([
        vec![
            "System name",
            "Geographic reach",
            "IPS type",
            "Volumes 2023\nIPS transactions",
            "Volumes 2024 IPS transactions",
        ],
        vec!["PesaLink", "Kenya", "Domestic", "100", "200"],
        vec!["GIP", "Ghana", "Domestic", "1,000", "2,000"],
        vec!["PayNow", "Ghana", "Domestic", "", "500"],
        vec!["NIP", "Nigeria", "Domestic", "n/a", "300"],
        vec!["Total", "", "", "1100", "3000"],
    ])
}

pub fn value_rows() -> SheetRows {
    rows_from([
        vec![
            "System name",
            "Geographic reach",
            "IPS type",
            "Exchange rate (LCU per $US)",
            "Value ($US) 2024 IPS transactions",
        ],
        vec!["PesaLink", "Kenya", "Domestic", "129.0", "10.5"],
        vec!["GIP", "Ghana", "Domestic", "12.1", "20"],
        vec!["PayNow", "Ghana", "Domestic", "12.1", "5"],
        vec!["NIP", "Nigeria", "Domestic", "1500", "7"],
        vec!["Total", "", "", "", "42.5"],
    ])
}

/// Roster tab with one or more rows in each category block of the default layout.
pub fn roster_rows() -> SheetRows {
    let mut rows: SheetRows = vec![Vec::new(); 87];
    let mut set = |idx: usize, cells: &[&str]| {
        rows[idx] = cells.iter().map(|c| c.to_string()).collect();
    };
    set(0, &["Live IPS List"]);
    set(3, &["PesaLink", "Kenya", "East Africa", "Domestic"]);
    set(4, &["GIP", "Ghana", "West Africa", "Domestic"]);
    set(5, &["PayNow", "Ghana", "West Africa", "Domestic"]);
    set(6, &["NIP", "Nigeria", "West Africa", "Domestic"]);
    set(40, &["Chad", "Planning"]);
    set(60, &["Eritrea"]);
    set(71, &["PAPSS", "Ghana, Nigeria, Kenya", "Africa", "Regional"]);
    set(75, &["EAC Cross-border", "Kenya, Uganda", "East Africa"]);
    set(80, &["TCIB", "South Africa, Namibia", "Southern Africa"]);
    set(83, &["Libya"]);
    rows
}

pub async fn fixture_sheets() -> StaticSheets {
    let layout = SheetLayout::default();
    let sheets = StaticSheets::new();
    sheets.set_range(SHEET_ID, &layout.profile_range, profile_rows()).await;
    sheets.set_range(SHEET_ID, &layout.inclusivity_range, inclusivity_rows()).await;
    sheets.set_range(SHEET_ID, &layout.volume_range, volume_rows()).await;
    sheets.set_range(SHEET_ID, &layout.value_range, value_rows()).await;
    sheets.set_range(SHEET_ID, &layout.roster_range, roster_rows()).await;
    sheets
}

pub fn settings() -> SyncSettings {
    SyncSettings {
        spreadsheet_ids: BTreeMap::from([(Language::English, SHEET_ID.to_string())]),
        layouts: BTreeMap::from([(Language::English, SheetLayout::default())]),
        thresholds: MatchThresholds::default(),
        timeout: Duration::from_secs(10),
    }
}

pub fn engine(sheets: StaticSheets, store: Arc<MemoryStore>) -> SyncEngine {
    let headers = HeaderNormalizer::embedded().expect("embedded header map parses");
    SyncEngine::new(Arc::new(sheets), store, Arc::new(headers), settings())
}

pub fn aggregator(store: Arc<MemoryStore>) -> Aggregator {
    let thresholds = MatchThresholds::default();
    Aggregator::new(
        store,
        Arc::new(CountryIndex::with_celes(thresholds.country)),
        thresholds,
        2024,
    )
}

/// A store holding one full sync of the fixture sheet.
pub async fn synced_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let outcomes = engine(fixture_sheets().await, store.clone()).sync_all().await;
    for outcome in &outcomes {
        assert!(outcome.is_ok(), "sync failed: {:?}", outcome.error);
    }
    store
}
