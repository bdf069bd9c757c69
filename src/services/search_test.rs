use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::state::test_helpers::{MockGeocoder, Mocks};

fn mocks_with(geocoder: MockGeocoder) -> Mocks {
    Mocks { geocoder: Arc::new(geocoder), ..Mocks::default() }
}

async fn settle() {
    tokio::time::sleep(Duration::from_secs(5)).await;
}

// =============================================================================
// GUARD
// =============================================================================

#[test]
fn guard_skips_identical_pending_query() {
    let mut guard = SearchGuard::new();
    assert_eq!(guard.admit("kochi"), Admission::Start { generation: 1 });
    assert_eq!(guard.admit("kochi"), Admission::Skip(SkipReason::AlreadyPending));
    assert!(guard.is_current(1));
}

#[test]
fn guard_remembers_only_lookups_that_created_a_record() {
    let mut guard = SearchGuard::new();
    let Admission::Start { generation } = guard.admit("kochi") else {
        panic!("expected start");
    };
    assert!(guard.finish(generation, Some(6)));
    assert!(!guard.is_current(generation));
    assert_eq!(guard.remembered("kochi"), Some(6));
    assert_eq!(guard.remembered("aluva"), None);

    let Admission::Start { generation } = guard.admit("aluva") else {
        panic!("expected start");
    };
    assert!(guard.finish(generation, None));
    assert_eq!(guard.remembered("aluva"), None);
    assert!(matches!(guard.admit("aluva"), Admission::Start { .. }));
}

#[test]
fn guard_forget_clears_only_matching_key() {
    let mut guard = SearchGuard::new();
    let Admission::Start { generation } = guard.admit("kochi") else {
        panic!("expected start");
    };
    guard.finish(generation, Some(6));
    guard.forget("aluva");
    assert_eq!(guard.remembered("kochi"), Some(6));
    guard.forget("kochi");
    assert_eq!(guard.remembered("kochi"), None);
}

#[test]
fn guard_discards_superseded_generation() {
    let mut guard = SearchGuard::new();
    let Admission::Start { generation: first } = guard.admit("kochi") else {
        panic!("expected start");
    };
    let Admission::Start { generation: second } = guard.admit("aluva") else {
        panic!("expected start");
    };
    assert!(second > first);
    assert!(!guard.finish(first, Some(1)));
    assert!(guard.is_current(second));
    assert_eq!(guard.remembered("kochi"), None);
    assert!(guard.finish(second, Some(2)));
}

#[test]
fn query_key_normalises_case_and_whitespace() {
    assert_eq!(query_key("  Kochi Port "), "kochi port");
}

#[tokio::test]
async fn guard_aborts_task_attached_to_stale_generation() {
    let mut guard = SearchGuard::new();
    let Admission::Start { generation } = guard.admit("kochi") else {
        panic!("expected start");
    };
    guard.admit("aluva");
    let task = tokio::spawn(std::future::pending::<()>());
    guard.attach(generation, task.abort_handle());
    let err = task.await.unwrap_err();
    assert!(err.is_cancelled());
}

// =============================================================================
// FLOW
// =============================================================================

#[tokio::test(start_paused = true)]
async fn local_match_selects_without_geocoding() {
    let mocks = mocks_with(MockGeocoder::returning("Kochi, Kerala, India", 9.93, 76.26));
    let state = mocks.app_state();

    let outcome = search(&state, "central hospital").await;
    let SearchOutcome::Local { facility } = outcome else {
        panic!("expected local match, got {outcome:?}");
    };
    assert_eq!(facility.id, 1);
    settle().await;

    assert_eq!(mocks.geocoder.call_count(), 0);
    let book = state.locations.read().await;
    assert_eq!(book.selected().map(|r| r.id), Some(1));
    assert!((book.view().zoom - crate::services::locations::SELECTED_ZOOM).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn miss_issues_one_geocode_and_appends_result() {
    let mocks = mocks_with(MockGeocoder::returning("Kochi, Kerala, India", 9.93, 76.26));
    let state = mocks.app_state();

    assert_eq!(search(&state, "Kochi").await, SearchOutcome::Geocoding { query: "Kochi".into() });
    settle().await;

    assert_eq!(mocks.geocoder.call_count(), 1);
    let book = state.locations.read().await;
    assert_eq!(book.records().len(), 6);
    let selected = book.selected().unwrap();
    assert_eq!(selected.name, "Kochi");
    assert!((selected.lat - 9.93).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn identical_query_while_pending_is_skipped() {
    let mocks = mocks_with(MockGeocoder {
        delay: Duration::from_secs(2),
        ..MockGeocoder::returning("Kochi, Kerala, India", 9.93, 76.26)
    });
    let state = mocks.app_state();

    search(&state, "Kochi").await;
    let again = search(&state, "  kochi ").await;
    assert_eq!(again, SearchOutcome::Skipped { query: "kochi".into(), reason: SkipReason::AlreadyPending });
    settle().await;

    assert_eq!(mocks.geocoder.call_count(), 1);
    assert_eq!(state.locations.read().await.records().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn resolved_query_reselects_record_without_geocoding() {
    let mocks = mocks_with(MockGeocoder::returning("Aluva, Kerala, India", 10.1, 76.35));
    let state = mocks.app_state();

    search(&state, "Thrissur District").await;
    settle().await;
    state.locations.write().await.clear_selection();

    let again = search(&state, "Thrissur District").await;
    let SearchOutcome::Local { facility } = again else {
        panic!("expected reselect, got {again:?}");
    };
    assert_eq!(facility.name, "Aluva");
    assert_eq!(mocks.geocoder.call_count(), 1);
    let book = state.locations.read().await;
    assert_eq!(book.records().len(), 6);
    assert_eq!(book.selected().map(|r| r.id), Some(facility.id));
}

#[tokio::test(start_paused = true)]
async fn resolved_query_geocodes_again_after_record_is_replaced() {
    let mocks = mocks_with(MockGeocoder::returning("Aluva, Kerala, India", 10.1, 76.35));
    let state = mocks.app_state();

    search(&state, "Thrissur District").await;
    settle().await;
    assert!(state.locations.read().await.find_by_name("Aluva").is_some());

    let data = serde_json::json!({
        "poi_data": { "hospital": [ { "name": "District Hospital", "latitude": 9.49, "longitude": 76.33 } ] }
    });
    crate::services::baseline::import(&state, &data, true).await;
    assert!(state.locations.read().await.find_by_name("Aluva").is_none());

    let again = search(&state, "Thrissur District").await;
    assert_eq!(again, SearchOutcome::Geocoding { query: "Thrissur District".into() });
    settle().await;

    assert_eq!(mocks.geocoder.call_count(), 2);
    let book = state.locations.read().await;
    assert!(book.find_by_name("Aluva").is_some());
    assert_eq!(book.records().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn different_query_during_debounce_cancels_first() {
    let mocks = mocks_with(MockGeocoder::returning("Aluva, Kerala, India", 10.1, 76.35));
    let state = mocks.app_state();

    search(&state, "Kochi").await;
    search(&state, "Aluva").await;
    settle().await;

    assert_eq!(mocks.geocoder.call_count(), 1);
    assert_eq!(mocks.geocoder.queries.lock().unwrap().as_slice(), ["Aluva"]);
    assert_eq!(state.locations.read().await.records().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn no_result_posts_info_notice() {
    let mocks = mocks_with(MockGeocoder::default());
    let state = mocks.app_state();

    search(&state, "Atlantis").await;
    settle().await;

    let notices = state.notices.lock().await.list();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Info);
    assert_eq!(state.locations.read().await.records().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn failed_lookup_warns_and_allows_retry() {
    let mocks = mocks_with(MockGeocoder { fail: true, ..MockGeocoder::default() });
    let state = mocks.app_state();

    search(&state, "Kochi").await;
    settle().await;
    assert_eq!(state.notices.lock().await.list()[0].severity, Severity::Warning);

    assert!(matches!(search(&state, "Kochi").await, SearchOutcome::Geocoding { .. }));
    settle().await;
    assert_eq!(mocks.geocoder.call_count(), 2);
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let state = Mocks::default().app_state();
    assert_eq!(search(&state, "   ").await, SearchOutcome::EmptyQuery);
}
