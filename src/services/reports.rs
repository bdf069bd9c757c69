//! Report service — synchronous report compilation and the report archive.
//!
//! Compilation calls run through [`with_retry`]. A combined (news + social)
//! report that still fails after retries is replaced by the RAG-only
//! report. The archive listing falls back to sample entries.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clients::http::{DEFAULT_RETRIES, DEFAULT_RETRY_BASE, with_retry};
use crate::clients::types::{ClientError, DisasterQuery, RecentReport, ReportDocument, ReportResponse};
use crate::error::ErrorCode;
use crate::services::notices::Severity;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid report query: {0}")]
    InvalidQuery(&'static str),
    #[error("report not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] ClientError),
}

impl ErrorCode for ReportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "E_INVALID_REPORT_QUERY",
            Self::NotFound(_) => "E_REPORT_NOT_FOUND",
            Self::Upstream(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Upstream(e) if e.retryable())
    }
}

/// Which collaborator writes the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileKind {
    /// Report backend over the RAG store.
    #[default]
    Rag,
    /// Social agent, social posts only.
    Social,
    /// Social agent, news and social posts.
    Combined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledReport {
    pub requested: CompileKind,
    /// Differs from `requested` after a fallback.
    pub produced_by: CompileKind,
    pub report: ReportResponse,
}

fn validate(query: &DisasterQuery) -> Result<(), ReportError> {
    if query.event_name.trim().is_empty() {
        return Err(ReportError::InvalidQuery("event_name is required"));
    }
    if query.start_date.trim().is_empty() || query.end_date.trim().is_empty() {
        return Err(ReportError::InvalidQuery("start_date and end_date are required"));
    }
    Ok(())
}

async fn compile_rag(state: &AppState, query: &DisasterQuery) -> Result<ReportResponse, ClientError> {
    with_retry(DEFAULT_RETRIES, DEFAULT_RETRY_BASE, move || state.clients.report.compile_report(query)).await
}

async fn compile_social(state: &AppState, query: &DisasterQuery) -> Result<ReportResponse, ClientError> {
    with_retry(DEFAULT_RETRIES, DEFAULT_RETRY_BASE, move || state.clients.social.social_report(query)).await
}

async fn compile_combined(state: &AppState, query: &DisasterQuery) -> Result<ReportResponse, ClientError> {
    with_retry(DEFAULT_RETRIES, DEFAULT_RETRY_BASE, move || state.clients.social.combined_report(query)).await
}

/// Compile a report of `kind` for the event in `query`.
///
/// # Errors
///
/// Returns an error for an invalid query or when every attempt failed,
/// including the fallback for combined reports.
pub async fn compile(
    state: &AppState,
    kind: CompileKind,
    query: &DisasterQuery,
) -> Result<CompiledReport, ReportError> {
    validate(query)?;
    info!(?kind, event = %query.event_name, "compiling report");

    let (produced_by, report) = match kind {
        CompileKind::Rag => (CompileKind::Rag, compile_rag(state, query).await?),
        CompileKind::Social => (CompileKind::Social, compile_social(state, query).await?),
        CompileKind::Combined => match compile_combined(state, query).await {
            Ok(report) => (CompileKind::Combined, report),
            Err(e) => {
                warn!(error = %e, "combined report failed, falling back to RAG report");
                state
                    .notify(Severity::Warning, "Combined report unavailable. Showing the news-only report.")
                    .await;
                (CompileKind::Rag, compile_rag(state, query).await?)
            }
        },
    };

    info!(?kind, ?produced_by, sources = report.sources.len(), "report compiled");
    Ok(CompiledReport { requested: kind, produced_by, report })
}

/// Ask the report backend to ingest a URL.
///
/// # Errors
///
/// Returns an error for a blank URL or a failed call.
pub async fn process_url(state: &AppState, url: &str) -> Result<serde_json::Value, ReportError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ReportError::InvalidQuery("url is required"));
    }
    let result = state.clients.report.process_url(url).await?;
    info!(%url, "url processed");
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentReports {
    pub reports: Vec<RecentReport>,
    /// `true` when `reports` are sample entries.
    pub fallback: bool,
}

/// Archive listing, or the sample entries when the jobs API is unreachable.
pub async fn recent_reports(state: &AppState) -> RecentReports {
    match state.clients.jobs.recent_reports().await {
        Ok(reports) => RecentReports { reports, fallback: false },
        Err(e) => {
            warn!(error = %e, "recent reports unavailable, using samples");
            state
                .notify(Severity::Warning, "Could not load recent reports. Showing sample reports.")
                .await;
            RecentReports { reports: crate::samples::recent_reports(), fallback: true }
        }
    }
}

/// Fetch one archived report.
///
/// # Errors
///
/// Returns [`ReportError::NotFound`] when the jobs API answers 404, or the
/// underlying client error.
pub async fn get_report(state: &AppState, report_id: &str) -> Result<ReportDocument, ReportError> {
    match state.clients.jobs.report(report_id).await {
        Ok(doc) => Ok(doc),
        Err(ClientError::Status { status: 404, .. }) => Err(ReportError::NotFound(report_id.to_owned())),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;
