//! Feed routes — post-disaster updates and manual news entry.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::clients::types::AddResponse;
use crate::model::{UpdateSource, UpdateStatus};
use crate::routes::{ApiError, api_error, client_error_status};
use crate::services::feed::{
    self, DEFAULT_PER_PAGE, FallbackReason, FeedError, FeedPage, FeedQuery, NewUpdate, NewsInput, SortKey, SortOrder,
    StoredUpdate,
};
use crate::state::AppState;

/// Query string of `GET /api/feed`. Status and source lists are
/// comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub page: usize,
    pub per_page: Option<usize>,
}

impl FeedParams {
    fn into_query(self) -> FeedQuery {
        fn split(raw: Option<&str>) -> impl Iterator<Item = &str> {
            raw.unwrap_or_default().split(',').map(str::trim).filter(|s| !s.is_empty())
        }
        FeedQuery {
            statuses: split(self.status.as_deref()).map(UpdateStatus::parse_lenient).collect(),
            sources: split(self.source.as_deref()).map(UpdateSource::parse_lenient).collect(),
            search: self.search,
            sort: self.sort,
            order: self.order,
            page: self.page,
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    #[serde(flatten)]
    pub page: FeedPage,
    pub fallback: Option<FallbackReason>,
    /// Human-readable fallback warning.
    pub warning: Option<&'static str>,
}

pub(crate) fn feed_error_to_response(err: &FeedError) -> ApiError {
    let status = match err {
        FeedError::InvalidUpdate(_) | FeedError::InvalidNews(_) => StatusCode::BAD_REQUEST,
        FeedError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FeedError::Upstream(e) => client_error_status(e),
    };
    api_error(status, err)
}

/// `GET /api/feed` — parsed, filtered, sorted, and paginated updates.
pub async fn list(State(state): State<AppState>, Query(params): Query<FeedParams>) -> Json<FeedResponse> {
    let batch = feed::load_feed(&state).await;
    let page = feed::view(&batch.updates, &params.into_query());
    Json(FeedResponse { page, fallback: batch.fallback, warning: batch.fallback.map(FallbackReason::message) })
}

/// `POST /api/feed/updates` — store a new update.
pub async fn create_update(
    State(state): State<AppState>,
    Json(body): Json<NewUpdate>,
) -> Result<(StatusCode, Json<StoredUpdate>), ApiError> {
    let record = body.into_record(OffsetDateTime::now_utc());
    let stored = feed::store_update(&state, record)
        .await
        .map_err(|e| feed_error_to_response(&e))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `POST /api/feed/news` — manual news entry.
pub async fn create_news(
    State(state): State<AppState>,
    Json(body): Json<NewsInput>,
) -> Result<(StatusCode, Json<AddResponse>), ApiError> {
    let ack = feed::submit_news(&state, body)
        .await
        .map_err(|e| feed_error_to_response(&e))?;
    Ok((StatusCode::CREATED, Json(ack)))
}
