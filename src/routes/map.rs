//! Map routes — locations, display mode, layers, selection, search.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::model::{DisplayMode, Facility, FacilityCategory};
use crate::routes::{ApiError, api_error};
use crate::services::locations::{LocationError, MapView, StatusSummary};
use crate::services::search::{self, SearchOutcome};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub mode: DisplayMode,
    pub layers: Vec<FacilityCategory>,
    pub selected: Option<Facility>,
    pub view: MapView,
    /// Records on visible layers.
    pub locations: Vec<Facility>,
    pub summary: StatusSummary,
}

#[derive(Debug, Deserialize)]
pub struct ModeBody {
    pub mode: DisplayMode,
}

#[derive(Debug, Deserialize)]
pub struct LayersBody {
    pub layers: Vec<FacilityCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SelectBody {
    pub id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub query: String,
}

pub(crate) fn location_error_to_response(err: &LocationError) -> ApiError {
    match err {
        LocationError::NotFound(_) => api_error(StatusCode::NOT_FOUND, err),
    }
}

async fn snapshot(state: &AppState) -> MapResponse {
    let book = state.locations.read().await;
    MapResponse {
        mode: book.mode(),
        layers: book.layers(),
        selected: book.selected().cloned(),
        view: book.view(),
        locations: book.visible().into_iter().cloned().collect(),
        summary: book.summary(),
    }
}

/// `GET /api/map/locations` — visible records with mode, selection, and view.
pub async fn locations(State(state): State<AppState>) -> Json<MapResponse> {
    Json(snapshot(&state).await)
}

/// `PUT /api/map/mode` — switch between pre- and post-disaster statuses.
pub async fn set_mode(State(state): State<AppState>, Json(body): Json<ModeBody>) -> Json<MapResponse> {
    state.locations.write().await.set_mode(body.mode);
    tracing::info!(mode = ?body.mode, "map mode changed");
    Json(snapshot(&state).await)
}

/// `PUT /api/map/layers` — replace visible layers. An empty list is ignored.
pub async fn set_layers(State(state): State<AppState>, Json(body): Json<LayersBody>) -> Json<MapResponse> {
    let applied = state.locations.write().await.set_layers(body.layers);
    if !applied {
        tracing::debug!("ignored empty layer selection");
    }
    Json(snapshot(&state).await)
}

/// `POST /api/map/select` — select a record by id, or clear with `null`.
pub async fn select(State(state): State<AppState>, Json(body): Json<SelectBody>) -> Result<Json<MapResponse>, ApiError> {
    {
        let mut book = state.locations.write().await;
        match body.id {
            Some(id) => {
                book.select(id).map_err(|e| location_error_to_response(&e))?;
            }
            None => book.clear_selection(),
        }
    }
    Ok(Json(snapshot(&state).await))
}

/// `POST /api/map/search` — local match or scheduled geocode.
pub async fn search(State(state): State<AppState>, Json(body): Json<SearchBody>) -> Json<SearchOutcome> {
    Json(search::search(&state, &body.query).await)
}

/// `GET /api/map/summary` — counts of active statuses.
pub async fn summary(State(state): State<AppState>) -> Json<StatusSummary> {
    Json(state.locations.read().await.summary())
}
