// tests/sync_engine.rs
//
// Full sync passes over the fixture spreadsheet, in memory.

mod common;

use serde_json::json;
use std::sync::Arc;

use reconcile_lib::models::{Collection, DatasetKind, Language, SyncReport};
use reconcile_lib::sheets::source::rows_from;
use reconcile_lib::sheets::SheetLayout;
use reconcile_lib::store::{DocumentStore, MemoryStore};
use reconcile_lib::sync::SyncOutcome;

fn collection(kind: DatasetKind) -> Collection {
    Collection::new(kind, Language::English)
}

fn report_for(outcomes: &[SyncOutcome], dataset: DatasetKind) -> SyncReport {
    outcomes
        .iter()
        .find(|o| o.dataset == dataset)
        .and_then(|o| o.report.clone())
        .unwrap_or_else(|| panic!("no report for {}", dataset))
}

#[tokio::test]
async fn test_first_sync_creates_every_document() {
    let store = Arc::new(MemoryStore::new());
    let engine = common::engine(common::fixture_sheets().await, store.clone());
    let outcomes = engine.sync_all().await;
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.is_ok()));

    let profile = report_for(&outcomes, DatasetKind::Profile);
    assert_eq!(profile.rows_read, 6);
    assert_eq!(profile.upserted, 4);
    assert_eq!(profile.skipped, 1);
    assert_eq!(profile.duplicates, 1);
    assert_eq!(profile.unmatched, vec!["Unknown Switch".to_string()]);

    let inclusivity = profile.inclusivity.expect("profile pass runs the inclusivity sub-pass");
    assert_eq!(inclusivity.rows_read, 3);
    assert_eq!(inclusivity.matched, 2);
    assert_eq!(inclusivity.modified, 2);
    assert_eq!(inclusivity.fuzzy_matches, 1);
    assert_eq!(inclusivity.unmatched, vec!["Unknown Switch".to_string()]);

    assert_eq!(report_for(&outcomes, DatasetKind::Volume).upserted, 5);
    assert_eq!(report_for(&outcomes, DatasetKind::Value).upserted, 5);
    assert_eq!(report_for(&outcomes, DatasetKind::Roster).upserted, 10);

    assert_eq!(store.len(collection(DatasetKind::Profile)).await, 4);
    assert_eq!(store.len(collection(DatasetKind::Roster)).await, 10);
}

#[tokio::test]
async fn test_second_sync_of_unchanged_sheets_modifies_nothing() {
    let store = Arc::new(MemoryStore::new());
    let engine = common::engine(common::fixture_sheets().await, store.clone());
    engine.sync_all().await;

    let outcomes = engine.sync_all().await;
    for outcome in &outcomes {
        let report = outcome.report.as_ref().expect("pass succeeded");
        assert!(report.is_converged(), "{} changed on resync", outcome.dataset);
        assert!(report.matched > 0);
    }
    let inclusivity = report_for(&outcomes, DatasetKind::Profile)
        .inclusivity
        .expect("sub-pass ran");
    assert_eq!(inclusivity.matched, 2);
    assert_eq!(inclusivity.modified, 0);
}

#[tokio::test]
async fn test_padded_duplicate_names_share_one_document() {
    let store = common::synced_store().await;
    let profiles = store.find_all(collection(DatasetKind::Profile)).await.unwrap();
    let paynow: Vec<_> = profiles
        .iter()
        .filter(|doc| doc["systemName"].as_str().is_some_and(|n| n.trim() == "PayNow"))
        .collect();
    assert_eq!(paynow.len(), 1);

    let doc = store
        .find_one(collection(DatasetKind::Profile), "paynow")
        .await
        .unwrap()
        .expect("keyed by canonical name");
    assert_eq!(doc["systemName"], json!("PayNow"));
    assert_eq!(doc["geographicReach"], json!("Ghana"));
    assert_eq!(doc["governanceTypology"], json!("Central Bank"));
}

#[tokio::test]
async fn test_inclusivity_patches_but_never_creates() {
    let store = common::synced_store().await;
    let profiles = collection(DatasetKind::Profile);

    let pesalink = store.find_one(profiles, "pesalink").await.unwrap().unwrap();
    assert_eq!(pesalink["inclusivityRanking"], json!("Advanced"));
    let gip = store.find_one(profiles, "gip").await.unwrap().unwrap();
    assert_eq!(gip["inclusivityRanking"], json!("Initial"));
    let nip = store.find_one(profiles, "nip").await.unwrap().unwrap();
    assert!(nip.get("inclusivityRanking").is_none());

    assert!(store.find_one(profiles, "unknown switch").await.unwrap().is_none());
    assert_eq!(store.len(profiles).await, 4);
}

#[tokio::test]
async fn test_series_cells_are_numbers_or_null() {
    let store = common::synced_store().await;
    let volumes = collection(DatasetKind::Volume);

    let gip = store.find_one(volumes, "gip").await.unwrap().unwrap();
    assert_eq!(gip["volumes2023"], json!(1000));
    assert_eq!(gip["volumes2024"], json!(2000));
    assert_eq!(gip["geographicReach"], json!("Ghana"));

    let nip = store.find_one(volumes, "nip").await.unwrap().unwrap();
    assert_eq!(nip["volumes2023"], json!(null));
    let paynow = store.find_one(volumes, "paynow").await.unwrap().unwrap();
    assert_eq!(paynow["volumes2023"], json!(null));

    let total = store
        .find_one(collection(DatasetKind::Value), "total")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(total["values2024"], json!(42.5));
    assert_eq!(total["exchangeRate"], json!(""));
}

#[tokio::test]
async fn test_roster_blocks_land_under_composite_keys() {
    let store = common::synced_store().await;
    let roster = store.find_all(collection(DatasetKind::Roster)).await.unwrap();

    let regional: Vec<_> = roster
        .iter()
        .filter(|doc| doc["category"] == json!("LIVE: REGIONAL IPS"))
        .collect();
    assert_eq!(regional.len(), 1);
    assert_eq!(regional[0]["ipsName"], json!("PAPSS"));
    assert_eq!(regional[0]["geographyCountries"], json!("Ghana, Nigeria, Kenya"));

    let live_domestic = roster
        .iter()
        .filter(|doc| doc["category"] == json!("LIVE: DOMESTIC IPS"))
        .count();
    assert_eq!(live_domestic, 4);
}

#[tokio::test]
async fn test_changed_cell_is_the_only_modification() {
    let store = Arc::new(MemoryStore::new());
    let sheets = common::fixture_sheets().await;
    let layout = SheetLayout::default();
    let engine = common::engine(sheets, store.clone());
    engine.sync(DatasetKind::Volume, Language::English).await.unwrap();

    let mut rows = common::volume_rows();
    rows[2][4] = "2,500".to_string();
    let changed = common::fixture_sheets().await;
    changed.set_range(common::SHEET_ID, &layout.volume_range, rows).await;
    let engine = common::engine(changed, store.clone());

    let report = engine.sync(DatasetKind::Volume, Language::English).await.unwrap();
    assert_eq!(report.matched, 5);
    assert_eq!(report.modified, 1);
    assert_eq!(report.upserted, 0);

    let gip = store
        .find_one(collection(DatasetKind::Volume), "gip")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(gip["volumes2024"], json!(2500));
}

#[tokio::test]
async fn test_rows_missing_from_the_sheet_are_kept() {
    let store = common::synced_store().await;
    let layout = SheetLayout::default();
    let sheets = common::fixture_sheets().await;
    sheets
        .set_range(
            common::SHEET_ID,
            &layout.profile_range,
            rows_from([vec!["System name", "IPS type"], vec!["GIP", "Domestic"]]),
        )
        .await;
    let engine = common::engine(sheets, store.clone());

    let report = engine.sync(DatasetKind::Profile, Language::English).await.unwrap();
    assert_eq!(report.matched, 1);
    assert_eq!(store.len(collection(DatasetKind::Profile)).await, 4);
}
