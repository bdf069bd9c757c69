use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use time::macros::datetime;

fn statuses(book: &LocationBook) -> Vec<FacilityStatus> {
    book.records().iter().map(|r| r.status).collect()
}

fn hit(name: &str) -> GeocodeHit {
    GeocodeHit { lat: 9.93, lon: 76.26, display_name: name.into() }
}

#[test]
fn new_book_projects_pre_mode() {
    let book = LocationBook::with_samples();
    assert_eq!(book.mode(), DisplayMode::Pre);
    assert!(book.records().iter().all(|r| r.status == r.pre_status));
}

#[test]
fn projecting_pre_twice_is_idempotent() {
    let mut book = LocationBook::with_samples();
    book.set_mode(DisplayMode::Pre);
    let once = statuses(&book);
    book.set_mode(DisplayMode::Pre);
    assert_eq!(statuses(&book), once);
}

#[test]
fn post_then_pre_round_trips() {
    let mut book = LocationBook::with_samples();
    let original = statuses(&book);
    book.set_mode(DisplayMode::Post);
    assert!(book.records().iter().all(|r| r.status == r.post_status));
    assert_ne!(statuses(&book), original);
    book.set_mode(DisplayMode::Pre);
    assert_eq!(statuses(&book), original);
}

#[test]
fn apply_change_in_pre_mode_keeps_active_status() {
    let mut book = LocationBook::with_samples();
    let at = datetime!(2025-05-03 09:00 UTC);
    book.apply_change(&StatusChange { id: 4, post_status: FacilityStatus::Destroyed, at })
        .unwrap();
    let record = book.get(4).unwrap();
    assert_eq!(record.post_status, FacilityStatus::Destroyed);
    assert_eq!(record.status, FacilityStatus::Operational);
    assert_eq!(record.last_updated, at);
}

#[test]
fn apply_change_in_post_mode_updates_active_status() {
    let mut book = LocationBook::with_samples();
    book.set_mode(DisplayMode::Post);
    book.apply_change(&StatusChange {
        id: 4,
        post_status: FacilityStatus::Damaged,
        at: datetime!(2025-05-03 09:00 UTC),
    })
    .unwrap();
    assert_eq!(book.get(4).unwrap().status, FacilityStatus::Damaged);
}

#[test]
fn apply_change_unknown_id_is_not_found() {
    let mut book = LocationBook::with_samples();
    let change = StatusChange { id: 999, post_status: FacilityStatus::Damaged, at: datetime!(2025-05-03 00:00 UTC) };
    let err = book.apply_change(&change).unwrap_err();
    assert_eq!(err, LocationError::NotFound(999));
}

#[test]
fn simulate_tick_mutates_one_or_two_records() {
    let mut book = LocationBook::with_samples();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let changes = book.simulate_tick(&mut rng, datetime!(2025-05-03 09:00 UTC));
        assert!((1..=2).contains(&changes.len()));
        if changes.len() == 2 {
            assert_ne!(changes[0].id, changes[1].id);
        }
    }
}

#[test]
fn simulate_tick_in_pre_mode_leaves_active_statuses() {
    let mut book = LocationBook::with_samples();
    let before = statuses(&book);
    let mut rng = StdRng::seed_from_u64(42);
    book.simulate_tick(&mut rng, datetime!(2025-05-03 09:00 UTC));
    assert_eq!(statuses(&book), before);
}

#[test]
fn simulate_tick_on_empty_book_is_noop() {
    let mut book = LocationBook::new(Vec::new());
    let mut rng = StdRng::seed_from_u64(1);
    assert!(book.simulate_tick(&mut rng, datetime!(2025-05-03 09:00 UTC)).is_empty());
}

#[test]
fn find_by_name_is_case_insensitive_substring() {
    let book = LocationBook::with_samples();
    assert_eq!(book.find_by_name("  central hosp "), Some(1));
    assert_eq!(book.find_by_name("BRIDGE"), Some(3));
    assert_eq!(book.find_by_name("Kochi"), None);
    assert_eq!(book.find_by_name("   "), None);
}

#[test]
fn select_centers_view() {
    let mut book = LocationBook::with_samples();
    let selected = book.select(3).unwrap().name.clone();
    assert_eq!(selected, "Main Bridge");
    let view = book.view();
    assert!((view.lat - 40.710).abs() < 1e-9);
    assert!((view.zoom - SELECTED_ZOOM).abs() < f64::EPSILON);
    book.clear_selection();
    assert!(book.selected().is_none());
}

#[test]
fn select_unknown_id_errors() {
    let mut book = LocationBook::with_samples();
    assert_eq!(book.select(77).unwrap_err(), LocationError::NotFound(77));
}

#[test]
fn set_layers_ignores_empty_set() {
    let mut book = LocationBook::with_samples();
    assert!(!book.set_layers(Vec::new()));
    assert_eq!(book.layers().len(), FacilityCategory::DEFAULT_LAYERS.len());
    assert!(book.set_layers([FacilityCategory::Hospital]));
    let visible: Vec<_> = book.visible().iter().map(|r| r.id).collect();
    assert_eq!(visible, vec![1]);
}

#[test]
fn search_results_are_always_visible_and_selected() {
    let mut book = LocationBook::with_samples();
    book.set_layers([FacilityCategory::School]);
    let id = book
        .insert_search_result(&hit("Kochi, Ernakulam, Kerala, India"), datetime!(2025-05-03 09:00 UTC))
        .id;
    assert_eq!(id, 6);
    let record = book.get(id).unwrap();
    assert_eq!(record.name, "Kochi");
    assert_eq!(record.category, FacilityCategory::SearchResult);
    assert_eq!(book.selected().map(|r| r.id), Some(id));
    assert!(book.visible().iter().any(|r| r.id == id));
    assert!((book.view().lng - 76.26).abs() < 1e-9);
}

#[test]
fn unmapped_imports_follow_the_layer_filter() {
    let mut book = LocationBook::with_samples();
    let mut market = imported("Town Market", 10.0, 76.0, Some("osm:55"));
    market.category = FacilityCategory::Other;
    book.merge_baseline(vec![market], false);
    assert!(book.visible().iter().any(|r| r.name == "Town Market"));

    book.set_layers([FacilityCategory::Hospital]);
    assert!(book.visible().iter().all(|r| r.name != "Town Market"));
}

#[test]
fn summary_counts_active_statuses() {
    let mut book = LocationBook::with_samples();
    assert_eq!(book.summary(), StatusSummary { operational: 5, damaged: 0, destroyed: 0 });
    book.set_mode(DisplayMode::Post);
    assert_eq!(book.summary(), StatusSummary { operational: 1, damaged: 3, destroyed: 1 });
}

fn imported(name: &str, lat: f64, lng: f64, source_ref: Option<&str>) -> Facility {
    let mut record = crate::samples::facilities().remove(0);
    record.id = 0;
    record.name = name.into();
    record.lat = lat;
    record.lng = lng;
    record.source_ref = source_ref.map(str::to_string);
    record
}

#[test]
fn merge_baseline_matches_on_coordinates_not_name() {
    let mut book = LocationBook::with_samples();
    let central = book.get(1).unwrap().clone();

    // Same place under a new name refreshes the record; same name elsewhere is a new one.
    let renamed = imported("Central Hospital (Annex)", central.lat, central.lng, None);
    let elsewhere = imported("Central Hospital", 1.0, 2.0, None);
    let (added, updated) = book.merge_baseline(vec![renamed, elsewhere], false);

    assert_eq!((added, updated), (1, 1));
    assert_eq!(book.get(1).unwrap().name, "Central Hospital (Annex)");
    let last = book.records().last().unwrap();
    assert_eq!((last.id, last.name.as_str()), (6, "Central Hospital"));
}

#[test]
fn merge_baseline_keeps_unnamed_pois_apart() {
    let mut book = LocationBook::with_samples();
    let incoming = vec![
        imported("Unnamed Hospital", 10.10, 76.35, None),
        imported("Unnamed Hospital", 10.20, 76.36, None),
        imported("Unnamed Hospital", 10.30, 76.37, None),
    ];
    let (added, updated) = book.merge_baseline(incoming, true);
    assert_eq!((added, updated), (3, 0));
    assert_eq!(book.records().len(), 3);
}

#[test]
fn merge_baseline_keeps_same_named_schools() {
    let mut book = LocationBook::new(Vec::new());
    let incoming = vec![
        imported("Government School", 10.10, 76.35, Some("osm:101")),
        imported("Government School", 10.50, 76.55, Some("osm:102")),
    ];
    assert_eq!(book.merge_baseline(incoming, false), (2, 0));
    assert_eq!(book.records().len(), 2);
}

#[test]
fn merge_baseline_updates_by_source_ref() {
    let mut book = LocationBook::new(Vec::new());
    book.merge_baseline(vec![imported("Old Name", 10.10, 76.35, Some("osm:7"))], false);

    let moved = imported("New Name", 10.11, 76.36, Some("osm:7"));
    assert_eq!(book.merge_baseline(vec![moved], false), (0, 1));
    let record = &book.records()[0];
    assert_eq!(record.name, "New Name");
    assert!((record.lat - 10.11).abs() < f64::EPSILON);
}

#[test]
fn add_facility_assigns_id_and_projects() {
    let mut book = LocationBook::with_samples();
    book.set_mode(DisplayMode::Post);
    let mut record = imported("Field Clinic", 10.0, 76.0, None);
    record.post_status = FacilityStatus::Damaged;
    let stored = book.add_facility(record);
    assert_eq!(stored.id, 6);
    assert_eq!(stored.status, FacilityStatus::Damaged);
}

#[test]
fn merge_baseline_replace_clears_book() {
    let mut book = LocationBook::with_samples();
    book.select(1).unwrap();
    let mut incoming = crate::samples::facilities();
    incoming.truncate(2);
    let (added, updated) = book.merge_baseline(incoming, true);
    assert_eq!((added, updated), (2, 0));
    assert_eq!(book.records().len(), 2);
    assert!(book.selected().is_none());
}
