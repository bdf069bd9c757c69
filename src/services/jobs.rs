//! Job watching — poll asynchronous backend jobs to a terminal state.
//!
//! DESIGN
//! ======
//! Submitting a job registers a watcher and spawns one poller task. The
//! poller asks the jobs API for status at a fixed interval, with no backoff
//! and no attempt limit, and records each answer in the registry.
//!
//! LIFECYCLE
//! =========
//! Polling stops when the job reports `completed` or `error`, or when the
//! watcher is stopped (the poller is aborted). A failed poll is logged and
//! counted, and the next tick tries again. Completed baseline jobs import
//! their POI data into the location book.
//!
//! Finished or stopped jobs stay readable for [`JOB_RETENTION`] after
//! their last update; registering a new job prunes older ones.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::task::AbortHandle;
use tracing::{info, warn};

use crate::clients::types::{ClientError, GenerateReportRequest, JobState, JobStatus, JobTicket};
use crate::error::ErrorCode;
use crate::services::baseline::{self, ImportSummary};
use crate::services::notices::Severity;
use crate::state::AppState;

/// How long a job that is no longer watched stays in the registry.
pub const JOB_RETENTION: time::Duration = time::Duration::minutes(15);

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] ClientError),
}

impl ErrorCode for JobError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_JOB_NOT_FOUND",
            Self::Upstream(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Upstream(e) if e.retryable())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Discovery,
    Report,
    Baseline,
}

/// Last known state of a watched job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProgress {
    pub job_id: String,
    pub kind: JobKind,
    pub status: JobState,
    /// Percentage in `0.0..=100.0`.
    pub progress: f64,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub polls: u32,
    pub failed_polls: u32,
    /// `false` once polling has ended for any reason.
    pub watching: bool,
    /// Set when a completed baseline job was merged into the map.
    pub imported: Option<ImportSummary>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl JobProgress {
    fn new(job_id: String, kind: JobKind, now: OffsetDateTime) -> Self {
        let status = match kind {
            JobKind::Discovery => JobState::Discovering,
            JobKind::Report | JobKind::Baseline => JobState::Processing,
        };
        Self {
            job_id,
            kind,
            status,
            progress: 0.0,
            result: None,
            error: None,
            polls: 0,
            failed_polls: 0,
            watching: true,
            imported: None,
            updated_at: now,
        }
    }
}

#[derive(Debug)]
struct Watched {
    progress: JobProgress,
    poller: Option<AbortHandle>,
}

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, Watched>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching `job_id`. Re-registering replaces the old watcher.
    pub fn register(&mut self, job_id: &str, kind: JobKind, now: OffsetDateTime) -> JobProgress {
        self.prune(now);
        let progress = JobProgress::new(job_id.to_owned(), kind, now);
        if let Some(old) = self
            .jobs
            .insert(job_id.to_owned(), Watched { progress: progress.clone(), poller: None })
        {
            if let Some(poller) = old.poller {
                poller.abort();
            }
        }
        progress
    }

    /// Drop jobs that stopped being watched more than [`JOB_RETENTION`]
    /// before `now`. Returns how many were removed.
    pub fn prune(&mut self, now: OffsetDateTime) -> usize {
        let before = self.jobs.len();
        self.jobs
            .retain(|_, w| w.progress.watching || now - w.progress.updated_at <= JOB_RETENTION);
        before - self.jobs.len()
    }

    /// Attach the poller task. A job no longer watched aborts it at once.
    pub fn attach(&mut self, job_id: &str, poller: AbortHandle) {
        match self.jobs.get_mut(job_id) {
            Some(w) if w.progress.watching => w.poller = Some(poller),
            _ => poller.abort(),
        }
    }

    #[must_use]
    pub fn get(&self, job_id: &str) -> Option<JobProgress> {
        self.jobs.get(job_id).map(|w| w.progress.clone())
    }

    /// All watched jobs, most recently updated first.
    #[must_use]
    pub fn list(&self) -> Vec<JobProgress> {
        let mut all: Vec<_> = self.jobs.values().map(|w| w.progress.clone()).collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.job_id.cmp(&b.job_id)));
        all
    }

    /// Record a poll answer. Returns `false` when the job is not watched,
    /// which tells the poller to stop.
    pub fn record(&mut self, job_id: &str, status: &JobStatus, now: OffsetDateTime) -> bool {
        let Some(watched) = self.jobs.get_mut(job_id) else {
            return false;
        };
        if !watched.progress.watching {
            return false;
        }
        let p = &mut watched.progress;
        p.status = status.status.clone();
        p.progress = status.progress.clamp(0.0, 100.0);
        p.result.clone_from(&status.result);
        p.error.clone_from(&status.error);
        p.polls += 1;
        p.updated_at = now;
        if status.status.is_terminal() {
            p.watching = false;
            watched.poller = None;
        }
        true
    }

    /// Count a failed poll. Returns `false` when the job is not watched.
    pub fn record_failure(&mut self, job_id: &str, now: OffsetDateTime) -> bool {
        match self.jobs.get_mut(job_id) {
            Some(w) if w.progress.watching => {
                w.progress.failed_polls += 1;
                w.progress.updated_at = now;
                true
            }
            _ => false,
        }
    }

    pub fn set_imported(&mut self, job_id: &str, summary: ImportSummary) {
        if let Some(w) = self.jobs.get_mut(job_id) {
            w.progress.imported = Some(summary);
        }
    }

    /// Stop polling `job_id`. The last known progress stays readable.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::NotFound`] for an unknown id.
    pub fn stop(&mut self, job_id: &str, now: OffsetDateTime) -> Result<JobProgress, JobError> {
        let watched = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_owned()))?;
        if let Some(poller) = watched.poller.take() {
            poller.abort();
        }
        watched.progress.watching = false;
        watched.progress.updated_at = now;
        Ok(watched.progress.clone())
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Register `ticket` and spawn its poller.
pub async fn watch(state: &AppState, ticket: JobTicket, kind: JobKind) -> JobProgress {
    let job_id = ticket.job_id;
    let progress = state.jobs.write().await.register(&job_id, kind, OffsetDateTime::now_utc());

    let interval = Duration::from_millis(state.config.job_poll_interval_ms.max(1));
    let task = tokio::spawn(poll_job(state.clone(), job_id.clone(), interval));
    state.jobs.write().await.attach(&job_id, task.abort_handle());

    info!(%job_id, ?kind, interval_ms = state.config.job_poll_interval_ms, "watching job");
    progress
}

/// Poll until the job is terminal or no longer watched.
pub async fn poll_job(state: AppState, job_id: String, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        match state.clients.jobs.job_status(&job_id).await {
            Ok(status) => {
                let now = OffsetDateTime::now_utc();
                if !state.jobs.write().await.record(&job_id, &status, now) {
                    return;
                }
                if status.status.is_terminal() {
                    finish(&state, &job_id, &status).await;
                    return;
                }
            }
            Err(e) => {
                warn!(%job_id, error = %e, "job poll failed, retrying next tick");
                if !state.jobs.write().await.record_failure(&job_id, OffsetDateTime::now_utc()) {
                    return;
                }
            }
        }
    }
}

async fn finish(state: &AppState, job_id: &str, status: &JobStatus) {
    let kind = state.jobs.read().await.get(job_id).map(|p| p.kind);

    if status.status == JobState::Error {
        let reason = status.error.as_deref().unwrap_or("unknown error");
        warn!(%job_id, %reason, "job failed");
        state.notify(Severity::Error, format!("Job {job_id} failed: {reason}")).await;
        return;
    }

    info!(%job_id, ?kind, "job completed");
    if kind == Some(JobKind::Baseline) {
        let Some(result) = &status.result else {
            return;
        };
        let summary = baseline::import(state, result, false).await;
        state.jobs.write().await.set_imported(job_id, summary);
    }
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Submit a report-generation job and watch it.
///
/// # Errors
///
/// Returns an error if the request names neither a discovery file nor a
/// query, or the submission fails.
pub async fn start_report_job(state: &AppState, request: &GenerateReportRequest) -> Result<JobProgress, JobError> {
    let ticket = state.clients.jobs.generate_report(request).await?;
    Ok(watch(state, ticket, JobKind::Report).await)
}

/// Submit a discovery job and watch it.
///
/// # Errors
///
/// Returns an error if the submission fails.
pub async fn start_discovery(state: &AppState, query: &str) -> Result<JobProgress, JobError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ClientError::InvalidRequest("query is required".into()).into());
    }
    let ticket = state.clients.jobs.discover(query).await?;
    Ok(watch(state, ticket, JobKind::Discovery).await)
}

/// Stop watching a job.
///
/// # Errors
///
/// Returns [`JobError::NotFound`] for an unknown id.
pub async fn stop_watching(state: &AppState, job_id: &str) -> Result<JobProgress, JobError> {
    let progress = state.jobs.write().await.stop(job_id, OffsetDateTime::now_utc())?;
    info!(%job_id, "stopped watching job");
    Ok(progress)
}

#[cfg(test)]
#[path = "jobs_test.rs"]
mod tests;
