//! Report-compiling backend client.

use super::ReportBackend;
use super::http::JsonHttp;
use super::types::{ClientError, DisasterQuery, ReportResponse};
use crate::config::HttpTimeouts;

pub struct ReportClient {
    http: JsonHttp,
}

impl ReportClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        Ok(Self { http: JsonHttp::new(base_url, timeouts, None)? })
    }
}

#[async_trait::async_trait]
impl ReportBackend for ReportClient {
    async fn compile_report(&self, query: &DisasterQuery) -> Result<ReportResponse, ClientError> {
        self.http.post("/compile_report_from_rag", query).await
    }

    async fn process_url(&self, url: &str) -> Result<serde_json::Value, ClientError> {
        if url.trim().is_empty() {
            return Err(ClientError::InvalidRequest("url must not be empty".into()));
        }
        self.http.post_query("/process_url", &[("url", url)]).await
    }

    async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.http.get("/health").await
    }
}
