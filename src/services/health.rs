//! Collaborator health — concurrent `/health` checks.

use serde::Serialize;
use tracing::warn;

use crate::clients::types::ClientError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Overall {
    Healthy,
    Degraded,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHealth {
    pub available: bool,
    /// Raw payload, or `{"status": "error", "error": ...}` when unreachable.
    pub status: serde_json::Value,
}

impl ServiceHealth {
    fn from_result(name: &str, result: Result<serde_json::Value, ClientError>) -> Self {
        match result {
            Ok(status) => Self { available: true, status },
            Err(e) => {
                warn!(service = name, error = %e, "health check failed");
                Self { available: false, status: serde_json::json!({ "status": "error", "error": e.to_string() }) }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub overall: Overall,
    pub rag: ServiceHealth,
    pub report: ServiceHealth,
    pub social: ServiceHealth,
}

#[must_use]
pub fn overall(available: &[bool]) -> Overall {
    match available.iter().filter(|a| **a).count() {
        0 => Overall::Down,
        n if n == available.len() => Overall::Healthy,
        _ => Overall::Degraded,
    }
}

/// Check all three collaborators at once. One failing check never hides
/// the others.
pub async fn check(state: &AppState) -> HealthReport {
    let (rag, report, social) = futures::join!(
        state.clients.rag.health(),
        state.clients.report.health(),
        state.clients.social.health(),
    );
    let rag = ServiceHealth::from_result("rag", rag);
    let report = ServiceHealth::from_result("report", report);
    let social = ServiceHealth::from_result("social", social);
    HealthReport { overall: overall(&[rag.available, report.available, social.available]), rag, report, social }
}
