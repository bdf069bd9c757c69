//! Shared error-code contract.
//!
//! Each module owns its own `thiserror` enum. This trait gives them a
//! common machine-readable code so handlers and notices can report failures
//! uniformly.

pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// JSON body returned by handlers on failure.
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ErrorBody {
    #[must_use]
    pub fn from_error<E: ErrorCode>(err: &E) -> Self {
        Self { code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}
