//! System routes — collaborator health and the notice board.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::routes::{ApiError, api_error};
use crate::services::health::{self, HealthReport};
use crate::services::notices::Notice;
use crate::state::AppState;

/// `GET /api/health` — check every collaborator.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(health::check(&state).await)
}

/// `GET /api/notices` — newest first.
pub async fn list_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.notices.lock().await.list())
}

/// `DELETE /api/notices/{id}`
pub async fn dismiss_notice(State(state): State<AppState>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    state
        .notices
        .lock()
        .await
        .dismiss(id)
        .map_err(|e| api_error(StatusCode::NOT_FOUND, &e))?;
    Ok(StatusCode::NO_CONTENT)
}
