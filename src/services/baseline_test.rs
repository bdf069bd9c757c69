use serde_json::json;
use time::macros::datetime;

use super::*;
use crate::error::ErrorCode;
use crate::state::test_helpers::Mocks;

const NOW: OffsetDateTime = datetime!(2025-05-03 12:00 UTC);

fn collection() -> serde_json::Value {
    json!({
        "poi_data": {
            "hospital": [
                {
                    "id": 4101,
                    "name": "District Hospital",
                    "latitude": 9.49,
                    "longitude": 76.33,
                    "details": "120 beds"
                },
                { "name": "No Coordinates Clinic", "latitude": "9.5", "longitude": 76.3 }
            ],
            "water": [
                { "latitude": 9.51, "longitude": 76.34, "lastUpdated": "2025-04-30T06:00:00Z" }
            ],
            "police": [
                { "name": "Town Police Station", "latitude": 9.52, "longitude": 76.35 }
            ],
            "shelter": []
        }
    })
}

#[test]
fn category_map_covers_osm_types() {
    assert_eq!(category_for("hospital"), FacilityCategory::Hospital);
    assert_eq!(category_for("fire_station"), FacilityCategory::Infrastructure);
    assert_eq!(category_for("power"), FacilityCategory::Infrastructure);
    assert_eq!(category_for("water"), FacilityCategory::WaterSource);
    assert_eq!(category_for("market"), FacilityCategory::Other);
}

#[test]
fn convert_skips_pois_without_numeric_coordinates() {
    let records = convert_osm(&collection(), NOW);
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(records.len(), 3);
    assert!(names.contains(&"District Hospital"));
    assert!(!names.contains(&"No Coordinates Clinic"));
}

#[test]
fn convert_fills_defaults() {
    let records = convert_osm(&collection(), NOW);
    let water = records.iter().find(|r| r.category == FacilityCategory::WaterSource).unwrap();
    assert_eq!(water.name, "Unnamed Water");
    assert_eq!(water.details, "No details available");
    assert_eq!(water.last_updated, datetime!(2025-04-30 06:00 UTC));

    let police = records.iter().find(|r| r.name == "Town Police Station").unwrap();
    assert_eq!(police.category, FacilityCategory::Infrastructure);
    assert_eq!(police.last_updated, NOW);
    assert!(records.iter().all(|r| r.pre_status == FacilityStatus::Operational));
}

#[test]
fn convert_keeps_upstream_id() {
    let records = convert_osm(&collection(), NOW);
    let hospital = records.iter().find(|r| r.name == "District Hospital").unwrap();
    assert_eq!(hospital.source_ref.as_deref(), Some("osm:4101"));
    let police = records.iter().find(|r| r.name == "Town Police Station").unwrap();
    assert!(police.source_ref.is_none());
}

#[test]
fn convert_without_poi_data_is_empty() {
    assert!(convert_osm(&json!({ "boundary": {} }), NOW).is_empty());
    assert!(convert_osm(&json!(null), NOW).is_empty());
}

#[test]
fn structure_progress_by_phase() {
    assert_eq!(structure_progress(&JobState::Completed, 10.0), StructureProgress::uniform(100.0));
    assert_eq!(structure_progress(&JobState::CollectingBoundary, 5.0), StructureProgress::uniform(100.0));
    assert_eq!(structure_progress(&JobState::CollectingPoi, 40.0), StructureProgress::uniform(60.0));
    assert_eq!(structure_progress(&JobState::CollectingPoi, 90.0), StructureProgress::uniform(100.0));
    assert_eq!(structure_progress(&JobState::Processing, 140.0), StructureProgress::uniform(100.0));
    assert_eq!(structure_progress(&JobState::Other("queued".into()), -3.0), StructureProgress::uniform(0.0));
}

#[tokio::test]
async fn import_merges_into_location_book() {
    let state = Mocks::default().app_state();
    let summary = import(&state, &collection(), false).await;
    assert_eq!(summary, ImportSummary { added: 3, updated: 0 });
    assert_eq!(state.locations.read().await.records().len(), 8);

    let again = import(&state, &collection(), false).await;
    assert_eq!(again, ImportSummary { added: 0, updated: 3 });
}

#[tokio::test]
async fn import_keeps_every_unnamed_and_same_named_poi() {
    let state = Mocks::default().app_state();
    let data = json!({
        "poi_data": {
            "hospital": [
                { "latitude": 10.10, "longitude": 76.35 },
                { "latitude": 10.20, "longitude": 76.36 },
                { "latitude": 10.30, "longitude": 76.37 }
            ],
            "school": [
                { "id": 1, "name": "Government School", "latitude": 10.01, "longitude": 76.30 },
                { "id": 2, "name": "Government School", "latitude": 10.41, "longitude": 76.50 }
            ]
        }
    });
    let summary = import(&state, &data, true).await;
    assert_eq!(summary, ImportSummary { added: 5, updated: 0 });
    let book = state.locations.read().await;
    let unnamed = book.records().iter().filter(|r| r.name == "Unnamed Hospital").count();
    let schools = book.records().iter().filter(|r| r.name == "Government School").count();
    assert_eq!((unnamed, schools), (3, 2));
}

#[tokio::test]
async fn import_with_replace_drops_samples() {
    let state = Mocks::default().app_state();
    import(&state, &collection(), true).await;
    let book = state.locations.read().await;
    assert_eq!(book.records().len(), 3);
    assert!(book.find_by_name("Central Hospital").is_none());
}

#[tokio::test]
async fn collect_rejects_blank_location() {
    let state = Mocks::default().app_state();
    let err = collect(&state, CollectRequest { location: "  ".into(), structures: None }).await.unwrap_err();
    assert_eq!(err.error_code(), "E_INVALID_REQUEST");
}

// =============================================================================
// DATABASE
// =============================================================================

fn names(table: &FacilityTable) -> Vec<&str> {
    table.facilities.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn table_defaults_to_name_ascending_five_per_page() {
    let mut records = crate::samples::facilities();
    let mut extra = records[0].clone();
    extra.id = 6;
    extra.name = "Annex Clinic".into();
    records.push(extra);

    let first = table(&records, &FacilityTableQuery::default());
    assert_eq!(first.total, 6);
    assert_eq!(first.per_page, 5);
    assert_eq!(names(&first)[0], "Annex Clinic");
    assert_eq!(first.facilities.len(), 5);

    let second = table(&records, &FacilityTableQuery { page: 1, ..FacilityTableQuery::default() });
    assert_eq!(second.facilities.len(), 1);
}

#[test]
fn table_filters_by_name_and_category() {
    let records = crate::samples::facilities();
    let query = FacilityTableQuery { search: Some(" HOSP ".into()), ..FacilityTableQuery::default() };
    assert_eq!(names(&table(&records, &query)), vec!["Central Hospital"]);

    let query = FacilityTableQuery {
        categories: vec![FacilityCategory::School, FacilityCategory::Bridge],
        ..FacilityTableQuery::default()
    };
    let result = table(&records, &query);
    assert_eq!(result.total, 2);
    let bridge_or_school = |r: &Facility| matches!(r.category, FacilityCategory::School | FacilityCategory::Bridge);
    assert!(result.facilities.iter().all(bridge_or_school));
}

#[test]
fn table_sorts_on_any_column() {
    let records = crate::samples::facilities();
    let by_lat =
        FacilityTableQuery { sort: TableSortKey::Lat, order: SortOrder::Desc, ..FacilityTableQuery::default() };
    let lats: Vec<f64> = table(&records, &by_lat).facilities.iter().map(|r| r.lat).collect();
    assert!(lats.windows(2).all(|w| w[0] >= w[1]));

    let by_priority = FacilityTableQuery { sort: TableSortKey::Priority, ..FacilityTableQuery::default() };
    let priorities: Vec<Priority> = table(&records, &by_priority).facilities.iter().map(|r| r.priority).collect();
    assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn parse_categories_rejects_unknown_names() {
    assert_eq!(
        parse_categories("hospital, Water_Source,").unwrap(),
        vec![FacilityCategory::Hospital, FacilityCategory::WaterSource]
    );
    assert_eq!(parse_categories("hospital,market").unwrap_err(), BaselineError::UnknownCategory("market".into()));
}

fn entry(name: &str, latitude: f64) -> NewFacility {
    NewFacility {
        name: name.into(),
        category: FacilityCategory::Shelter,
        latitude,
        longitude: 76.3,
        details: String::new(),
        priority: Priority::High,
    }
}

#[test]
fn new_facility_validation() {
    let record = entry("  Town Hall Shelter ", 10.0).into_facility(NOW).unwrap();
    assert_eq!(record.name, "Town Hall Shelter");
    assert_eq!(record.details, "No details available");
    assert_eq!(record.post_status, FacilityStatus::Operational);

    assert_eq!(entry(" ", 10.0).into_facility(NOW).unwrap_err().error_code(), "E_INVALID_FACILITY");
    assert!(entry("Shelter", 91.0).into_facility(NOW).is_err());
    let mut reserved = entry("Shelter", 10.0);
    reserved.category = FacilityCategory::SearchResult;
    assert!(reserved.into_facility(NOW).is_err());
}

#[tokio::test]
async fn add_facility_lands_in_location_book() {
    let state = Mocks::default().app_state();
    let stored = add_facility(&state, entry("Town Hall Shelter", 10.0)).await.unwrap();
    assert_eq!(stored.id, 6);
    assert_eq!(state.locations.read().await.get(6).map(|r| r.name.clone()), Some("Town Hall Shelter".into()));
}
