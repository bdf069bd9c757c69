//! Jobs API client (discovery, report generation, baseline collection).

use super::JobsApi;
use super::http::JsonHttp;
use super::types::{
    ClientError, CollectRequest, GenerateReportRequest, JobStatus, JobTicket, RecentReport, ReportDocument,
};
use crate::config::HttpTimeouts;

pub struct JobsClient {
    http: JsonHttp,
}

impl JobsClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        Ok(Self { http: JsonHttp::new(base_url, timeouts, None)? })
    }
}

/// Identifiers are interpolated into paths, so they must be a single segment.
pub(crate) fn validate_id(id: &str) -> Result<&str, ClientError> {
    let id = id.trim();
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(ClientError::InvalidRequest(format!("invalid identifier: {id:?}")));
    }
    Ok(id)
}

pub(crate) fn validate_generate(request: &GenerateReportRequest) -> Result<(), ClientError> {
    let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    if has(&request.discovery_file) || has(&request.query) {
        Ok(())
    } else {
        Err(ClientError::InvalidRequest("either discovery_file or query must be provided".into()))
    }
}

#[async_trait::async_trait]
impl JobsApi for JobsClient {
    async fn discover(&self, query: &str) -> Result<JobTicket, ClientError> {
        self.http
            .post("/discover", &serde_json::json!({ "query": query }))
            .await
    }

    async fn generate_report(&self, request: &GenerateReportRequest) -> Result<JobTicket, ClientError> {
        validate_generate(request)?;
        self.http.post("/generate-report", request).await
    }

    async fn collect_location(&self, request: &CollectRequest) -> Result<JobTicket, ClientError> {
        self.http.post("/pre-disaster/collect", request).await
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        let id = validate_id(job_id)?;
        self.http.get(&format!("/job/{id}")).await
    }

    async fn recent_reports(&self) -> Result<Vec<RecentReport>, ClientError> {
        self.http.get("/reports").await
    }

    async fn report(&self, report_id: &str) -> Result<ReportDocument, ClientError> {
        let id = validate_id(report_id)?;
        self.http.get(&format!("/report/{id}")).await
    }
}

#[cfg(test)]
#[path = "jobs_test.rs"]
mod tests;
