//! Baseline routes — import collected POIs, start collection jobs, and the
//! facility database.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::clients::types::CollectRequest;
use crate::model::Facility;
use crate::routes::reports::{JobView, job_error_to_response};
use crate::routes::{ApiError, api_error};
use crate::services::baseline::{
    self, BaselineError, DEFAULT_TABLE_PER_PAGE, FacilityTable, FacilityTableQuery, ImportRequest, ImportSummary,
    NewFacility, TableSortKey,
};
use crate::services::feed::SortOrder;
use crate::state::AppState;

/// Query string for `GET /api/baseline/facilities`. `type` is a
/// comma-separated category list.
#[derive(Debug, Default, Deserialize)]
pub struct TableParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub categories: Option<String>,
    #[serde(default)]
    pub sort: TableSortKey,
    pub order: Option<SortOrder>,
    #[serde(default)]
    pub page: usize,
    pub per_page: Option<usize>,
}

impl TableParams {
    fn into_query(self) -> Result<FacilityTableQuery, BaselineError> {
        Ok(FacilityTableQuery {
            categories: baseline::parse_categories(self.categories.as_deref().unwrap_or_default())?,
            search: self.search,
            sort: self.sort,
            order: self.order.unwrap_or(SortOrder::Asc),
            page: self.page,
            per_page: self.per_page.unwrap_or(DEFAULT_TABLE_PER_PAGE),
        })
    }
}

pub(crate) fn baseline_error_to_response(err: &BaselineError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, err)
}

/// `POST /api/baseline/import` — merge a collection result into the map.
pub async fn import(State(state): State<AppState>, Json(body): Json<ImportRequest>) -> Json<ImportSummary> {
    Json(baseline::import(&state, &body.data, body.replace).await)
}

/// `POST /api/baseline/collect` — start a collection job for a location.
pub async fn collect(
    State(state): State<AppState>,
    Json(body): Json<CollectRequest>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let progress = baseline::collect(&state, body)
        .await
        .map_err(|e| job_error_to_response(&e))?;
    Ok((StatusCode::ACCEPTED, Json(progress.into())))
}

/// `GET /api/baseline/facilities` — searchable, sortable facility table.
pub async fn facilities(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<FacilityTable>, ApiError> {
    let query = params.into_query().map_err(|e| baseline_error_to_response(&e))?;
    let book = state.locations.read().await;
    Ok(Json(baseline::table(book.records(), &query)))
}

/// `POST /api/baseline/facilities` — add a facility by hand.
pub async fn add_facility(
    State(state): State<AppState>,
    Json(body): Json<NewFacility>,
) -> Result<(StatusCode, Json<Facility>), ApiError> {
    let stored = baseline::add_facility(&state, body)
        .await
        .map_err(|e| baseline_error_to_response(&e))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_helpers::Mocks;

    #[tokio::test]
    async fn import_adds_records() {
        let state = Mocks::default().app_state();
        let data = serde_json::json!({
            "poi_data": {
                "hospital": [
                    { "name": "Aluva District Hospital", "latitude": 10.108, "longitude": 76.357 }
                ]
            }
        });
        let body = ImportRequest { data, replace: false };
        let Json(summary) = import(State(state.clone()), Json(body)).await;
        assert_eq!(summary, ImportSummary { added: 1, updated: 0 });
        assert_eq!(state.locations.read().await.records().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn collect_returns_baseline_job() {
        let mocks = Mocks::default();
        let body = CollectRequest { location: " Kochi ".into(), structures: None };
        let (status, Json(view)) = collect(State(mocks.app_state()), Json(body)).await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(view.structures.is_some());
        assert_eq!(*mocks.jobs.submitted.lock().unwrap(), vec!["collect:Kochi".to_string()]);
    }

    #[tokio::test]
    async fn collect_blank_location_is_400() {
        let body = CollectRequest { location: "  ".into(), structures: None };
        let (status, _) = collect(State(Mocks::default().app_state()), Json(body)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn facilities_table_defaults() {
        let state = Mocks::default().app_state();
        let Json(table) = facilities(State(state), Query(TableParams::default())).await.unwrap();
        assert_eq!(table.total, 5);
        assert_eq!(table.per_page, 5);
        assert_eq!(table.facilities[0].name, "Central Hospital");
    }

    #[tokio::test]
    async fn facilities_filter_by_type() {
        let state = Mocks::default().app_state();
        let params = TableParams { categories: Some("school,bridge".into()), ..TableParams::default() };
        let Json(table) = facilities(State(state.clone()), Query(params)).await.unwrap();
        assert_eq!(table.total, 2);

        let params = TableParams { categories: Some("market".into()), ..TableParams::default() };
        let (status, Json(body)) = facilities(State(state), Query(params)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "E_UNKNOWN_CATEGORY");
    }

    #[tokio::test]
    async fn add_facility_is_created() {
        let state = Mocks::default().app_state();
        let body: NewFacility = serde_json::from_value(serde_json::json!({
            "name": "Riverside Shelter",
            "type": "shelter",
            "latitude": 10.0,
            "longitude": 76.3
        }))
        .unwrap();
        let (status, Json(record)) = add_facility(State(state.clone()), Json(body)).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record.id, 6);
        assert_eq!(state.locations.read().await.records().len(), 6);
    }

    #[tokio::test]
    async fn add_facility_blank_name_is_400() {
        let body: NewFacility = serde_json::from_value(serde_json::json!({
            "name": " ",
            "type": "school",
            "latitude": 0.0,
            "longitude": 0.0
        }))
        .unwrap();
        let (status, _) = add_facility(State(Mocks::default().app_state()), Json(body)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
