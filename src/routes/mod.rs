//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dashboard talks to this service only through the JSON API below.
//! Handlers translate HTTP to service calls and map service errors to
//! status codes with an [`ErrorBody`] payload.

pub mod baseline;
pub mod feed;
pub mod map;
pub mod reports;
pub mod social;
pub mod system;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::types::ClientError;
use crate::error::{ErrorBody, ErrorCode};
use crate::state::AppState;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn api_error<E: ErrorCode>(status: StatusCode, err: &E) -> ApiError {
    (status, Json(ErrorBody::from_error(err)))
}

/// Status for a collaborator failure: caller mistakes are 400, a missing
/// upstream resource is 404, everything else is a bad gateway.
pub(crate) fn client_error_status(err: &ClientError) -> StatusCode {
    match err {
        ClientError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ClientError::Status { status: 404, .. } => StatusCode::NOT_FOUND,
        ClientError::HttpClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ClientError::Request(_) | ClientError::Status { .. } | ClientError::Parse(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Full API router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/health", get(system::health))
        .route("/api/notices", get(system::list_notices))
        .route("/api/notices/{id}", delete(system::dismiss_notice))
        .route("/api/map/locations", get(map::locations))
        .route("/api/map/mode", put(map::set_mode))
        .route("/api/map/layers", put(map::set_layers))
        .route("/api/map/select", post(map::select))
        .route("/api/map/search", post(map::search))
        .route("/api/map/summary", get(map::summary))
        .route("/api/feed", get(feed::list))
        .route("/api/feed/updates", post(feed::create_update))
        .route("/api/feed/news", post(feed::create_news))
        .route("/api/social/posts", get(social::list).post(social::create))
        .route("/api/social/posts/{id}/save", post(social::toggle_saved))
        .route("/api/social/posts/{id}/verify", post(social::verify))
        .route("/api/social/posts/{id}/promote", post(social::promote))
        .route("/api/social/fetch", post(social::fetch))
        .route("/api/reports/compile", post(reports::compile))
        .route("/api/reports/process-url", post(reports::process_url))
        .route("/api/reports/discover", post(reports::discover))
        .route("/api/reports/jobs", get(reports::list_jobs).post(reports::start_job))
        .route("/api/reports/jobs/{id}", get(reports::job).delete(reports::stop_job))
        .route("/api/reports/recent", get(reports::recent))
        .route("/api/reports/{id}", get(reports::report))
        .route("/api/baseline/import", post(baseline::import))
        .route("/api/baseline/collect", post(baseline::collect))
        .route("/api/baseline/facilities", get(baseline::facilities).post(baseline::add_facility))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
