//! RAG store client (`/add/*`, `/query`, `/health`).

use super::RagStore;
use super::http::JsonHttp;
use super::types::{AddResponse, ClientError, NewsItem, QueryRequest, QueryResponse, SocialPostInput, UserInput};
use crate::config::HttpTimeouts;

pub struct RagClient {
    http: JsonHttp,
}

impl RagClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        Ok(Self { http: JsonHttp::new(base_url, timeouts, None)? })
    }
}

#[async_trait::async_trait]
impl RagStore for RagClient {
    async fn add_user_input(&self, input: &UserInput) -> Result<AddResponse, ClientError> {
        self.http.post("/add/user", input).await
    }

    async fn add_news(&self, item: &NewsItem) -> Result<AddResponse, ClientError> {
        self.http.post("/add/news", item).await
    }

    async fn add_social(&self, post: &SocialPostInput) -> Result<AddResponse, ClientError> {
        self.http.post("/add/social", post).await
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError> {
        self.http.post("/query", request).await
    }

    async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.http.get("/health").await
    }
}
