//! Social routes — monitored posts, promotion, and agent fetches.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::clients::types::{DisasterQuery, SocialFetchResponse};
use crate::model::SocialPost;
use crate::routes::feed::feed_error_to_response;
use crate::routes::{ApiError, api_error, client_error_status};
use crate::services::feed::StoredUpdate;
use crate::services::social::{self, NewPost, SocialError, SocialFilter};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_verified() -> bool {
    true
}

pub(crate) fn social_error_to_response(err: &SocialError) -> ApiError {
    match err {
        SocialError::NotFound(_) => api_error(StatusCode::NOT_FOUND, err),
        SocialError::InvalidPost(_) => api_error(StatusCode::BAD_REQUEST, err),
        SocialError::Feed(e) => feed_error_to_response(e),
        SocialError::Upstream(e) => api_error(client_error_status(e), err),
    }
}

/// `GET /api/social/posts`
pub async fn list(State(state): State<AppState>, Query(filter): Query<SocialFilter>) -> Json<Vec<SocialPost>> {
    Json(state.social.read().await.filter(&filter))
}

/// `POST /api/social/posts`
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewPost>,
) -> Result<(StatusCode, Json<SocialPost>), ApiError> {
    let post = social::add_post(&state, body)
        .await
        .map_err(|e| social_error_to_response(&e))?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// `POST /api/social/posts/{id}/save`
pub async fn toggle_saved(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<SocialPost>, ApiError> {
    let mut monitor = state.social.write().await;
    let post = monitor.toggle_saved(id).map_err(|e| social_error_to_response(&e))?;
    Ok(Json(post.clone()))
}

/// `POST /api/social/posts/{id}/verify`
pub async fn verify(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<VerifyBody>,
) -> Result<Json<SocialPost>, ApiError> {
    let mut monitor = state.social.write().await;
    let post = monitor
        .set_verified(id, body.verified)
        .map_err(|e| social_error_to_response(&e))?;
    tracing::info!(id, verified = body.verified, "post verification changed");
    Ok(Json(post.clone()))
}

/// `POST /api/social/posts/{id}/promote` — store the post as a feed update.
pub async fn promote(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<(StatusCode, Json<StoredUpdate>), ApiError> {
    let stored = social::promote(&state, id)
        .await
        .map_err(|e| social_error_to_response(&e))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `POST /api/social/fetch`
pub async fn fetch(
    State(state): State<AppState>,
    Json(query): Json<DisasterQuery>,
) -> Result<Json<SocialFetchResponse>, ApiError> {
    let response = social::fetch(&state, &query)
        .await
        .map_err(|e| social_error_to_response(&e))?;
    Ok(Json(response))
}

#[cfg(test)]
#[path = "social_test.rs"]
mod tests;
