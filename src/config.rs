//! Service configuration parsed from environment variables.
//!
//! Every value has a default that matches the local development layout of
//! the collaborators (RAG store on 8000, report backend on 8080, social agent
//! on 8081). Invalid numbers fall back to defaults; empty URLs are errors.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RAG_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REPORT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_SOCIAL_API_URL: &str = "http://localhost:8081";
pub const DEFAULT_JOBS_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "disasterlens/0.1";
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SIMULATION_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_JOB_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_FEED_QUERY: &str = "Kerala floods disaster information";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    EmptyUrl { var: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_HTTP_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_HTTP_CONNECT_TIMEOUT_SECS }
    }
}

/// Base URLs of the external collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rag: String,
    pub report: String,
    pub social: String,
    pub jobs: String,
    pub geocoder: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub endpoints: Endpoints,
    pub geocoder_user_agent: String,
    pub timeouts: HttpTimeouts,
    /// Interval between simulated status mutations. Zero disables the simulation.
    pub simulation_interval_ms: u64,
    pub job_poll_interval_ms: u64,
    pub search_debounce_ms: u64,
    /// Query the shared feed sends to the RAG store.
    pub feed_query: String,
}

impl ServiceConfig {
    /// Build typed config from environment variables.
    ///
    /// - `PORT`: default 3000
    /// - `RAG_API_URL`, `REPORT_API_URL`, `SOCIAL_API_URL`, `JOBS_API_URL`, `GEOCODER_URL`
    /// - `GEOCODER_USER_AGENT`: sent with every geocoder request
    /// - `HTTP_REQUEST_TIMEOUT_SECS`: default 30
    /// - `HTTP_CONNECT_TIMEOUT_SECS`: default 10
    /// - `SIMULATION_INTERVAL_MS`: default 30000, `0` disables
    /// - `JOB_POLL_INTERVAL_MS`: default 2000
    /// - `SEARCH_DEBOUNCE_MS`: default 300
    /// - `FEED_QUERY`: default `"Kerala floods disaster information"`
    ///
    /// # Errors
    ///
    /// Returns an error if a URL variable is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoints = Endpoints {
            rag: env_url("RAG_API_URL", DEFAULT_RAG_API_URL)?,
            report: env_url("REPORT_API_URL", DEFAULT_REPORT_API_URL)?,
            social: env_url("SOCIAL_API_URL", DEFAULT_SOCIAL_API_URL)?,
            jobs: env_url("JOBS_API_URL", DEFAULT_JOBS_API_URL)?,
            geocoder: env_url("GEOCODER_URL", DEFAULT_GEOCODER_URL)?,
        };
        let timeouts = HttpTimeouts {
            request_secs: env_parse("HTTP_REQUEST_TIMEOUT_SECS", DEFAULT_HTTP_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("HTTP_CONNECT_TIMEOUT_SECS", DEFAULT_HTTP_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            endpoints,
            geocoder_user_agent: std::env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_GEOCODER_USER_AGENT.to_string()),
            timeouts,
            simulation_interval_ms: env_parse("SIMULATION_INTERVAL_MS", DEFAULT_SIMULATION_INTERVAL_MS),
            job_poll_interval_ms: env_parse("JOB_POLL_INTERVAL_MS", DEFAULT_JOB_POLL_INTERVAL_MS),
            search_debounce_ms: env_parse("SEARCH_DEBOUNCE_MS", DEFAULT_SEARCH_DEBOUNCE_MS),
            feed_query: std::env::var("FEED_QUERY").unwrap_or_else(|_| DEFAULT_FEED_QUERY.to_string()),
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            endpoints: Endpoints {
                rag: DEFAULT_RAG_API_URL.into(),
                report: DEFAULT_REPORT_API_URL.into(),
                social: DEFAULT_SOCIAL_API_URL.into(),
                jobs: DEFAULT_JOBS_API_URL.into(),
                geocoder: DEFAULT_GEOCODER_URL.into(),
            },
            geocoder_user_agent: DEFAULT_GEOCODER_USER_AGENT.into(),
            timeouts: HttpTimeouts::default(),
            simulation_interval_ms: DEFAULT_SIMULATION_INTERVAL_MS,
            job_poll_interval_ms: DEFAULT_JOB_POLL_INTERVAL_MS,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            feed_query: DEFAULT_FEED_QUERY.into(),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_url(var: &'static str, default: &str) -> Result<String, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyUrl { var });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
