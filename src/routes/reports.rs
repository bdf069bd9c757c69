//! Report routes — synchronous compilation, async report jobs, archive.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::clients::types::{DisasterQuery, GenerateReportRequest, ReportDocument};
use crate::routes::{ApiError, api_error, client_error_status};
use crate::services::baseline::{StructureProgress, structure_progress};
use crate::services::jobs::{self, JobError, JobKind, JobProgress};
use crate::services::reports::{self, CompileKind, CompiledReport, RecentReports, ReportError};
use crate::state::AppState;

/// Body of `POST /api/reports/compile`: the event window plus the kind.
#[derive(Debug, Deserialize)]
pub struct CompileBody {
    #[serde(default)]
    pub kind: CompileKind,
    #[serde(flatten)]
    pub query: DisasterQuery,
}

#[derive(Debug, Deserialize)]
pub struct UrlBody {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverBody {
    pub query: String,
}

/// A watched job, with per-structure progress for baseline collection.
#[derive(Debug, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub progress: JobProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structures: Option<StructureProgress>,
}

impl From<JobProgress> for JobView {
    fn from(progress: JobProgress) -> Self {
        let structures =
            (progress.kind == JobKind::Baseline).then(|| structure_progress(&progress.status, progress.progress));
        Self { progress, structures }
    }
}

pub(crate) fn report_error_to_response(err: &ReportError) -> ApiError {
    let status = match err {
        ReportError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        ReportError::NotFound(_) => StatusCode::NOT_FOUND,
        ReportError::Upstream(e) => client_error_status(e),
    };
    api_error(status, err)
}

pub(crate) fn job_error_to_response(err: &JobError) -> ApiError {
    let status = match err {
        JobError::NotFound(_) => StatusCode::NOT_FOUND,
        JobError::Upstream(e) => client_error_status(e),
    };
    api_error(status, err)
}

/// `POST /api/reports/compile`
pub async fn compile(
    State(state): State<AppState>,
    Json(body): Json<CompileBody>,
) -> Result<Json<CompiledReport>, ApiError> {
    let report = reports::compile(&state, body.kind, &body.query)
        .await
        .map_err(|e| report_error_to_response(&e))?;
    Ok(Json(report))
}

/// `POST /api/reports/process-url`
pub async fn process_url(
    State(state): State<AppState>,
    Json(body): Json<UrlBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = reports::process_url(&state, &body.url)
        .await
        .map_err(|e| report_error_to_response(&e))?;
    Ok(Json(result))
}

/// `POST /api/reports/discover` — start a discovery job.
pub async fn discover(
    State(state): State<AppState>,
    Json(body): Json<DiscoverBody>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let progress = jobs::start_discovery(&state, &body.query)
        .await
        .map_err(|e| job_error_to_response(&e))?;
    Ok((StatusCode::ACCEPTED, Json(progress.into())))
}

/// `POST /api/reports/jobs` — start a report generation job.
pub async fn start_job(
    State(state): State<AppState>,
    Json(body): Json<GenerateReportRequest>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
    let progress = jobs::start_report_job(&state, &body)
        .await
        .map_err(|e| job_error_to_response(&e))?;
    Ok((StatusCode::ACCEPTED, Json(progress.into())))
}

/// `GET /api/reports/jobs`
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobView>> {
    let list = state.jobs.read().await.list();
    Json(list.into_iter().map(JobView::from).collect())
}

/// `GET /api/reports/jobs/{id}`
pub async fn job(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<JobView>, ApiError> {
    let progress = state.jobs.read().await.get(&id);
    progress
        .map(|p| Json(p.into()))
        .ok_or_else(|| job_error_to_response(&JobError::NotFound(id)))
}

/// `DELETE /api/reports/jobs/{id}` — stop polling; progress stays readable.
pub async fn stop_job(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<JobView>, ApiError> {
    let progress = jobs::stop_watching(&state, &id)
        .await
        .map_err(|e| job_error_to_response(&e))?;
    Ok(Json(progress.into()))
}

/// `GET /api/reports/recent`
pub async fn recent(State(state): State<AppState>) -> Json<RecentReports> {
    Json(reports::recent_reports(&state).await)
}

/// `GET /api/reports/{id}`
pub async fn report(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ReportDocument>, ApiError> {
    let doc = reports::get_report(&state, &id)
        .await
        .map_err(|e| report_error_to_response(&e))?;
    Ok(Json(doc))
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;
