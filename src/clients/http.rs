//! Thin JSON-over-HTTP wrapper shared by every collaborator client.
//!
//! Response decoding is split into the pure [`decode`] function so status
//! and body handling can be tested without a server.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::types::ClientError;
use crate::config::HttpTimeouts;
use crate::error::ErrorCode;

/// Retries applied to report generation calls.
pub const DEFAULT_RETRIES: u32 = 2;
/// First retry delay; doubles on each attempt (500ms, 1s, 2s, ...).
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(500);

pub struct JsonHttp {
    http: reqwest::Client,
    base_url: String,
}

impl JsonHttp {
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client cannot be built.
    pub fn new(base_url: &str, timeouts: HttpTimeouts, user_agent: Option<&str>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs));
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent.to_owned());
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.http.get(self.url(path))).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    /// POST with parameters in the query string and no body.
    pub async fn post_query<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ClientError> {
        self.send(self.http.post(self.url(path)).query(query)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;
        decode(status, &text)
    }
}

/// Turn a status code and body into a typed value.
pub(crate) fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Status { status, body: body.to_owned() });
    }
    serde_json::from_str(body).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Run `call` until it succeeds, a non-retryable error occurs, or `retries`
/// extra attempts are spent. Waits `base * 2^attempt` between attempts.
///
/// # Errors
///
/// Returns the last error observed.
pub async fn with_retry<T, F, Fut>(retries: u32, base: Duration, mut call: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries && e.retryable() => {
                let delay = base.saturating_mul(2u32.saturating_pow(attempt));
                warn!(attempt = attempt + 1, total = retries + 1, error = %e, ?delay, "upstream call failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
