//! Wire types and errors shared by the collaborator clients.
//!
//! Field names follow the collaborators' JSON exactly. Optional fields are
//! skipped when absent so the Python services apply their own defaults.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by collaborator client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The collaborator returned a non-success HTTP status.
    #[error("unexpected status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The caller supplied something the collaborator cannot accept.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_UPSTREAM_REQUEST",
            Self::Status { .. } => "E_UPSTREAM_STATUS",
            Self::Parse(_) => "E_UPSTREAM_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::InvalidRequest(_) => "E_INVALID_REQUEST",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// RAG STORE
// =============================================================================

/// Collection names understood by the RAG store.
pub const COLLECTION_NEWS: &str = "news";
pub const COLLECTION_USER_INPUTS: &str = "user_inputs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPostInput {
    pub content: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Acknowledgement returned by every `/add/*` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddResponse {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub collections: Vec<String>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub collection: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<QueryHit>,
}

// =============================================================================
// REPORTS
// =============================================================================

/// Event window every report endpoint accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterQuery {
    pub event_name: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    /// Markdown body.
    pub report: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub event_name: String,
    pub start_date: String,
    pub end_date: String,
}

/// Summary returned by the social agent after a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialFetchResponse {
    pub status: String,
    #[serde(default)]
    pub stored_count: u64,
    #[serde(default)]
    pub total_posts_found: serde_json::Value,
    #[serde(default)]
    pub event: String,
}

// =============================================================================
// JOBS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTicket {
    pub job_id: String,
}

/// Lifecycle state reported by the jobs API. Unknown states are kept
/// verbatim so pollers keep going instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Discovering,
    Processing,
    CollectingBoundary,
    CollectingPoi,
    Completed,
    Error,
    Other(String),
}

impl JobState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Discovering => "discovering",
            Self::Processing => "processing",
            Self::CollectingBoundary => "collecting_boundary",
            Self::CollectingPoi => "collecting_poi",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for JobState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "discovering" => Self::Discovering,
            "processing" => Self::Processing,
            "collecting_boundary" => Self::CollectingBoundary,
            "collecting_poi" => Self::CollectingPoi,
            "completed" => Self::Completed,
            "error" => Self::Error,
            _ => Self::Other(raw),
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateReportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Job,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentReport {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub content: String,
    #[serde(default = "default_report_format")]
    pub format: String,
}

fn default_report_format() -> String {
    "markdown".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectRequest {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structures: Option<Vec<String>>,
}

// =============================================================================
// GEOCODER
// =============================================================================

/// First result of a free-text geocoding lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeHit {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
