//! Map search — local name match first, geocoder second.
//!
//! DESIGN
//! ======
//! A query that matches a local record (case-insensitive substring) selects
//! it and never reaches the geocoder. Otherwise a geocode task is spawned
//! after a debounce delay. [`SearchGuard`] decides whether a query may
//! start a request:
//!
//! - the same query while its request is pending: skipped,
//! - a different query while one is pending: the pending task is aborted
//!   and replaced, so two geocode requests never overlap.
//!
//! The guard remembers which record the last successful lookup created.
//! Repeating that query re-selects the record instead of geocoding again,
//! but only while the record still exists: once a baseline replace or any
//! other removal drops it, the memory is forgotten and the query geocodes
//! afresh.
//!
//! Completions carry the generation they were started with; a completion
//! from a superseded generation is ignored. Lock order is guard, then
//! location book.

use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::task::AbortHandle;
use tracing::{info, warn};

use crate::model::Facility;
use crate::services::notices::Severity;
use crate::state::AppState;

// =============================================================================
// GUARD
// =============================================================================

/// Why a query did not start a geocode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Start { generation: u64 },
    Skip(SkipReason),
}

#[derive(Debug)]
struct Pending {
    key: String,
    generation: u64,
    abort: Option<AbortHandle>,
}

#[derive(Debug)]
struct Resolved {
    key: String,
    record_id: u64,
}

#[derive(Debug, Default)]
pub struct SearchGuard {
    pending: Option<Pending>,
    resolved: Option<Resolved>,
    generation: u64,
}

/// Normalised form used to compare queries.
#[must_use]
pub fn query_key(query: &str) -> String {
    query.trim().to_lowercase()
}

impl SearchGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `key` may start a request. On `Start`, any other
    /// pending request is aborted.
    pub fn admit(&mut self, key: &str) -> Admission {
        if self.pending.as_ref().is_some_and(|p| p.key == key) {
            return Admission::Skip(SkipReason::AlreadyPending);
        }

        if let Some(previous) = self.pending.take() {
            if let Some(abort) = previous.abort {
                abort.abort();
            }
            info!(query = %previous.key, "superseded pending geocode search");
        }

        self.generation += 1;
        self.pending = Some(Pending { key: key.to_owned(), generation: self.generation, abort: None });
        Admission::Start { generation: self.generation }
    }

    /// Attach the task running `generation` so a later query can abort it.
    pub fn attach(&mut self, generation: u64, abort: AbortHandle) {
        match &mut self.pending {
            Some(pending) if pending.generation == generation => pending.abort = Some(abort),
            _ => abort.abort(),
        }
    }

    /// Whether `generation` is the request currently pending.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.pending.as_ref().is_some_and(|p| p.generation == generation)
    }

    /// Record created by the last successful lookup of `key`, if any.
    #[must_use]
    pub fn remembered(&self, key: &str) -> Option<u64> {
        self.resolved.as_ref().filter(|r| r.key == key).map(|r| r.record_id)
    }

    /// Drop the remembered record for `key`.
    pub fn forget(&mut self, key: &str) {
        if self.resolved.as_ref().is_some_and(|r| r.key == key) {
            self.resolved = None;
        }
    }

    /// Mark `generation` finished. Returns `false` for a superseded
    /// generation, whose result must be discarded. Only a lookup that
    /// created a record is remembered; failures may be retried with the
    /// same query.
    pub fn finish(&mut self, generation: u64, record_id: Option<u64>) -> bool {
        match self.pending.take() {
            Some(pending) if pending.generation == generation => {
                if let Some(record_id) = record_id {
                    self.resolved = Some(Resolved { key: pending.key, record_id });
                }
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }
}

// =============================================================================
// FLOW
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// A local record matched; the map is centered on it.
    Local { facility: Facility },
    /// A geocode request was scheduled.
    Geocoding { query: String },
    Skipped { query: String, reason: SkipReason },
    EmptyQuery,
}

/// Run a map search against local records, falling back to the geocoder.
pub async fn search(state: &AppState, query: &str) -> SearchOutcome {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return SearchOutcome::EmptyQuery;
    }

    {
        let mut book = state.locations.write().await;
        if let Some(id) = book.find_by_name(trimmed) {
            if let Ok(facility) = book.select(id) {
                return SearchOutcome::Local { facility: facility.clone() };
            }
        }
    }

    let key = query_key(trimmed);
    let mut guard = state.search.lock().await;
    if let Some(id) = guard.remembered(&key) {
        let mut book = state.locations.write().await;
        if let Ok(facility) = book.select(id) {
            return SearchOutcome::Local { facility: facility.clone() };
        }
        info!(query = %trimmed, id, "remembered search result is gone, geocoding again");
        guard.forget(&key);
    }
    let generation = match guard.admit(&key) {
        Admission::Start { generation } => generation,
        Admission::Skip(reason) => return SearchOutcome::Skipped { query: trimmed.to_owned(), reason },
    };

    let debounce = Duration::from_millis(state.config.search_debounce_ms);
    let task = tokio::spawn(run_geocode(state.clone(), trimmed.to_owned(), generation, debounce));
    guard.attach(generation, task.abort_handle());

    SearchOutcome::Geocoding { query: trimmed.to_owned() }
}

async fn run_geocode(state: AppState, query: String, generation: u64, debounce: Duration) {
    if !debounce.is_zero() {
        tokio::time::sleep(debounce).await;
    }

    let result = state.clients.geocoder.search(&query).await;

    // Claim the generation before touching the book so a superseded result
    // never lands.
    let mut guard = state.search.lock().await;
    if !guard.is_current(generation) {
        return;
    }

    match result {
        Ok(Some(hit)) => {
            let mut book = state.locations.write().await;
            let record = book.insert_search_result(&hit, OffsetDateTime::now_utc());
            info!(%query, id = record.id, lat = hit.lat, lon = hit.lon, "geocode search added location");
            guard.finish(generation, Some(record.id));
        }
        Ok(None) => {
            guard.finish(generation, None);
            drop(guard);
            info!(%query, "geocode search found nothing");
            state
                .notify(Severity::Info, format!("No location found for \"{query}\""))
                .await;
        }
        Err(e) => {
            guard.finish(generation, None);
            drop(guard);
            warn!(%query, error = %e, "geocode search failed");
            state
                .notify(Severity::Warning, format!("Location search unavailable: {e}"))
                .await;
        }
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
