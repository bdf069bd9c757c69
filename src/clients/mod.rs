//! Clients for the external collaborators.
//!
//! DESIGN
//! ======
//! Each collaborator sits behind an `async_trait` so services depend on the
//! behaviour, not on reqwest. [`Collaborators::from_config`] wires up the
//! HTTP implementations; tests substitute hand-written mocks.

pub mod geocode;
pub mod http;
pub mod jobs;
pub mod rag;
pub mod report;
pub mod social;
pub mod types;

use std::sync::Arc;

use types::{
    AddResponse, ClientError, CollectRequest, DisasterQuery, GenerateReportRequest, GeocodeHit, JobStatus, JobTicket,
    NewsItem, QueryRequest, QueryResponse, RecentReport, ReportDocument, ReportResponse, SocialFetchResponse,
    SocialPostInput, UserInput,
};

use crate::config::ServiceConfig;

// =============================================================================
// TRAITS
// =============================================================================

/// Document store with vector/text query.
#[async_trait::async_trait]
pub trait RagStore: Send + Sync {
    async fn add_user_input(&self, input: &UserInput) -> Result<AddResponse, ClientError>;
    async fn add_news(&self, item: &NewsItem) -> Result<AddResponse, ClientError>;
    async fn add_social(&self, post: &SocialPostInput) -> Result<AddResponse, ClientError>;
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError>;
    async fn health(&self) -> Result<serde_json::Value, ClientError>;
}

/// Backend that compiles markdown reports from the RAG store.
#[async_trait::async_trait]
pub trait ReportBackend: Send + Sync {
    async fn compile_report(&self, query: &DisasterQuery) -> Result<ReportResponse, ClientError>;
    async fn process_url(&self, url: &str) -> Result<serde_json::Value, ClientError>;
    async fn health(&self) -> Result<serde_json::Value, ClientError>;
}

/// Social-media collection and reporting agent.
#[async_trait::async_trait]
pub trait SocialAgent: Send + Sync {
    async fn fetch_social_data(&self, query: &DisasterQuery) -> Result<SocialFetchResponse, ClientError>;
    async fn social_report(&self, query: &DisasterQuery) -> Result<ReportResponse, ClientError>;
    async fn combined_report(&self, query: &DisasterQuery) -> Result<ReportResponse, ClientError>;
    async fn health(&self) -> Result<serde_json::Value, ClientError>;
}

/// Free-text place lookup.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `query`, or `None` when nothing matched.
    async fn search(&self, query: &str) -> Result<Option<GeocodeHit>, ClientError>;
}

/// Asynchronous job API (discovery, report generation, baseline collection).
#[async_trait::async_trait]
pub trait JobsApi: Send + Sync {
    async fn discover(&self, query: &str) -> Result<JobTicket, ClientError>;
    async fn generate_report(&self, request: &GenerateReportRequest) -> Result<JobTicket, ClientError>;
    async fn collect_location(&self, request: &CollectRequest) -> Result<JobTicket, ClientError>;
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ClientError>;
    async fn recent_reports(&self) -> Result<Vec<RecentReport>, ClientError>;
    async fn report(&self, report_id: &str) -> Result<ReportDocument, ClientError>;
}

// =============================================================================
// WIRING
// =============================================================================

/// The full set of collaborators a running service talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub rag: Arc<dyn RagStore>,
    pub report: Arc<dyn ReportBackend>,
    pub social: Arc<dyn SocialAgent>,
    pub geocoder: Arc<dyn Geocoder>,
    pub jobs: Arc<dyn JobsApi>,
}

impl Collaborators {
    /// Build HTTP clients for every collaborator.
    ///
    /// # Errors
    ///
    /// Returns an error if any HTTP client fails to build.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ClientError> {
        let endpoints = &config.endpoints;
        Ok(Self {
            rag: Arc::new(rag::RagClient::new(&endpoints.rag, config.timeouts)?),
            report: Arc::new(report::ReportClient::new(&endpoints.report, config.timeouts)?),
            social: Arc::new(social::SocialClient::new(&endpoints.social, config.timeouts)?),
            geocoder: Arc::new(geocode::NominatimClient::new(
                &endpoints.geocoder,
                &config.geocoder_user_agent,
                config.timeouts,
            )?),
            jobs: Arc::new(jobs::JobsClient::new(&endpoints.jobs, config.timeouts)?),
        })
    }
}
