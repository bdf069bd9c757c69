use std::sync::Arc;

use super::*;
use crate::clients::types::ClientError;
use crate::services::feed::FeedError;
use crate::state::test_helpers::{MockRag, MockSocial, Mocks};

fn query() -> DisasterQuery {
    DisasterQuery {
        event_name: "Kerala floods".into(),
        start_date: "2025-05-01".into(),
        end_date: "2025-05-03".into(),
        query: None,
        max_results: None,
    }
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

#[test]
fn not_found_is_404() {
    let (status, Json(body)) = social_error_to_response(&SocialError::NotFound(7));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.code, "E_POST_NOT_FOUND");
}

#[test]
fn invalid_post_is_400() {
    let (status, _) = social_error_to_response(&SocialError::InvalidPost("content is required"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
fn nested_feed_error_keeps_its_status() {
    let err = SocialError::Feed(FeedError::InvalidUpdate("type is required"));
    let (status, Json(body)) = social_error_to_response(&err);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, "E_INVALID_UPDATE");
}

#[test]
fn upstream_error_is_bad_gateway() {
    let err = SocialError::Upstream(ClientError::Request("refused".into()));
    let (status, Json(body)) = social_error_to_response(&err);
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.retryable);
}

// =============================================================================
// HANDLERS
// =============================================================================

#[tokio::test]
async fn list_applies_filter() {
    let state = Mocks::default().app_state();
    let filter = SocialFilter { verified_only: true, ..SocialFilter::default() };
    let Json(posts) = list(State(state), Query(filter)).await;
    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|p| p.verified));
}

#[tokio::test]
async fn create_prepends_post() {
    let state = Mocks::default().app_state();
    let body = NewPost {
        platform: "twitter".into(),
        username: "Field Reporter".into(),
        user_handle: None,
        content: "Flooding near Main Bridge, road closed".into(),
        tags: Vec::new(),
        has_media: false,
    };
    let (status, Json(post)) = create(State(state.clone()), Json(body)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post.user_handle, "@field_reporter");
    assert_eq!(state.social.read().await.filter(&SocialFilter::default())[0].id, post.id);
}

#[tokio::test]
async fn toggle_saved_flips_flag() {
    let state = Mocks::default().app_state();
    let Json(post) = toggle_saved(State(state.clone()), Path(2)).await.unwrap();
    assert!(post.saved);
    let Json(post) = toggle_saved(State(state), Path(2)).await.unwrap();
    assert!(!post.saved);
}

#[tokio::test]
async fn verify_unknown_post_is_404() {
    let state = Mocks::default().app_state();
    let (status, _) = verify(State(state), Path(99), Json(VerifyBody { verified: true })).await.unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verify_defaults_to_true() {
    let body: VerifyBody = serde_json::from_str("{}").unwrap();
    assert!(body.verified);
    let state = Mocks::default().app_state();
    let Json(post) = verify(State(state), Path(4), Json(body)).await.unwrap();
    assert!(post.verified);
}

#[tokio::test]
async fn promote_stores_update() {
    let mocks = Mocks::default();
    let (status, Json(stored)) = promote(State(mocks.app_state()), Path(1)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert!(stored.success);
    assert_eq!(mocks.rag.user_inputs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn promote_failure_is_bad_gateway() {
    let mocks = Mocks { rag: Arc::new(MockRag { fail: true, ..MockRag::default() }), ..Mocks::default() };
    let (status, _) = promote(State(mocks.app_state()), Path(1)).await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn fetch_passes_through() {
    let Json(response) = fetch(State(Mocks::default().app_state()), Json(query())).await.unwrap();
    assert_eq!(response.stored_count, 3);
    assert_eq!(response.event, "Kerala floods");
}

#[tokio::test]
async fn fetch_failure_maps_status() {
    let mocks = Mocks { social: Arc::new(MockSocial { fail: true, ..MockSocial::default() }), ..Mocks::default() };
    let (status, _) = fetch(State(mocks.app_state()), Json(query())).await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
