//! Social-media agent client.

use super::SocialAgent;
use super::http::JsonHttp;
use super::types::{ClientError, DisasterQuery, ReportResponse, SocialFetchResponse};
use crate::config::HttpTimeouts;

pub struct SocialClient {
    http: JsonHttp,
}

impl SocialClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        Ok(Self { http: JsonHttp::new(base_url, timeouts, None)? })
    }
}

#[async_trait::async_trait]
impl SocialAgent for SocialClient {
    async fn fetch_social_data(&self, query: &DisasterQuery) -> Result<SocialFetchResponse, ClientError> {
        self.http.post("/fetch_social_data", query).await
    }

    async fn social_report(&self, query: &DisasterQuery) -> Result<ReportResponse, ClientError> {
        self.http.post("/social_report", query).await
    }

    async fn combined_report(&self, query: &DisasterQuery) -> Result<ReportResponse, ClientError> {
        self.http.post("/combined_report", query).await
    }

    async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.http.get("/health").await
    }
}
