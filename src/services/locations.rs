//! Location book — facility records behind the map and its side panel.
//!
//! DESIGN
//! ======
//! The book owns every facility the map knows about, the active display
//! mode, the visible layers, the selection, and the view center. Three
//! writers touch it: mode toggles, simulated status changes, and records
//! merged in from geocoding search or baseline import.
//!
//! INVARIANTS
//! ==========
//! After any mutation, every record's `status` equals
//! `mode.snapshot(record)`. Mode projection is idempotent and, absent
//! post-status changes in between, `Pre -> Post -> Pre` restores the
//! original statuses exactly.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IteratorRandom;
use serde::Serialize;
use time::OffsetDateTime;

use crate::clients::types::GeocodeHit;
use crate::model::{DisplayMode, Facility, FacilityCategory, FacilityStatus, Priority};

/// Map center when nothing is selected.
pub const DEFAULT_VIEW: MapView = MapView { lat: 40.712, lng: -74.006, zoom: 12.0 };
/// Zoom level used when centering on a selected record.
pub const SELECTED_ZOOM: f64 = 15.0;
/// Two imported records closer than this in both axes are the same place.
const SAME_PLACE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location not found: {0}")]
    NotFound(u64),
}

impl crate::error::ErrorCode for LocationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_LOCATION_NOT_FOUND",
        }
    }
}

/// Counts of active statuses across all records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub operational: usize,
    pub damaged: usize,
    pub destroyed: usize,
}

/// A single simulated or reported status mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub id: u64,
    pub post_status: FacilityStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct LocationBook {
    records: Vec<Facility>,
    mode: DisplayMode,
    layers: HashSet<FacilityCategory>,
    selected: Option<u64>,
    view: MapView,
    next_id: u64,
}

impl LocationBook {
    /// Build a book over `records`, projecting them into pre-disaster mode.
    #[must_use]
    pub fn new(mut records: Vec<Facility>) -> Self {
        project(&mut records, DisplayMode::Pre);
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            records,
            mode: DisplayMode::Pre,
            layers: FacilityCategory::DEFAULT_LAYERS.into_iter().collect(),
            selected: None,
            view: DEFAULT_VIEW,
            next_id,
        }
    }

    #[must_use]
    pub fn with_samples() -> Self {
        Self::new(crate::samples::facilities())
    }

    #[must_use]
    pub fn records(&self) -> &[Facility] {
        &self.records
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Facility> {
        self.selected.and_then(|id| self.get(id))
    }

    #[must_use]
    pub fn view(&self) -> MapView {
        self.view
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Facility> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Visible layers in a stable order.
    #[must_use]
    pub fn layers(&self) -> Vec<FacilityCategory> {
        let mut layers: Vec<_> = self.layers.iter().copied().collect();
        layers.sort_by_key(|c| c.as_str());
        layers
    }

    // =========================================================================
    // MODE + LAYERS
    // =========================================================================

    /// Switch display mode and re-project every record.
    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        project(&mut self.records, mode);
    }

    /// Replace the visible layer set. An empty set is ignored and `false`
    /// is returned, matching a toggle group that cannot be fully cleared.
    pub fn set_layers(&mut self, layers: impl IntoIterator<Item = FacilityCategory>) -> bool {
        let layers: HashSet<_> = layers.into_iter().collect();
        if layers.is_empty() {
            return false;
        }
        self.layers = layers;
        true
    }

    /// Records on visible layers. Search results are always visible.
    #[must_use]
    pub fn visible(&self) -> Vec<&Facility> {
        self.records
            .iter()
            .filter(|r| r.category == FacilityCategory::SearchResult || self.layers.contains(&r.category))
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for record in &self.records {
            match record.status {
                FacilityStatus::Operational => summary.operational += 1,
                FacilityStatus::Damaged => summary.damaged += 1,
                FacilityStatus::Destroyed => summary.destroyed += 1,
            }
        }
        summary
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Select a record and center the view on it.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::NotFound`] if no record has that id.
    pub fn select(&mut self, id: u64) -> Result<&Facility, LocationError> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(LocationError::NotFound(id))?;
        let record = &self.records[idx];
        self.selected = Some(id);
        self.view = MapView { lat: record.lat, lng: record.lng, zoom: SELECTED_ZOOM };
        Ok(&self.records[idx])
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// First record whose name contains `query`, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, query: &str) -> Option<u64> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.name.to_lowercase().contains(&needle))
            .map(|r| r.id)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Record a new post-disaster status. The active status follows only
    /// when the map is showing post-disaster data.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::NotFound`] if no record has that id.
    pub fn apply_change(&mut self, change: &StatusChange) -> Result<(), LocationError> {
        let mode = self.mode;
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == change.id)
            .ok_or(LocationError::NotFound(change.id))?;
        record.post_status = change.post_status;
        record.last_updated = change.at;
        if mode == DisplayMode::Post {
            record.status = change.post_status;
        }
        Ok(())
    }

    /// Mutate one or two random records' post-disaster status.
    pub fn simulate_tick<R: Rng + ?Sized>(&mut self, rng: &mut R, at: OffsetDateTime) -> Vec<StatusChange> {
        if self.records.is_empty() {
            return Vec::new();
        }
        let count = rng.random_range(1..=2).min(self.records.len());
        let ids: Vec<u64> = self.records.iter().map(|r| r.id).choose_multiple(rng, count);

        let mut changes = Vec::with_capacity(ids.len());
        for id in ids {
            let post_status = FacilityStatus::ALL[rng.random_range(0..FacilityStatus::ALL.len())];
            let change = StatusChange { id, post_status, at };
            if self.apply_change(&change).is_ok() {
                changes.push(change);
            }
        }
        changes
    }

    /// Append a synthetic record for a geocoding hit, select it, and center on it.
    pub fn insert_search_result(&mut self, hit: &GeocodeHit, at: OffsetDateTime) -> &Facility {
        let id = self.allocate_id();
        let name = hit
            .display_name
            .split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Search result")
            .to_string();
        let mut record = Facility {
            id,
            name,
            lat: hit.lat,
            lng: hit.lon,
            category: FacilityCategory::SearchResult,
            status: FacilityStatus::Operational,
            pre_status: FacilityStatus::Operational,
            post_status: FacilityStatus::Operational,
            priority: Priority::Low,
            details: hit.display_name.clone(),
            last_updated: at,
            source_ref: None,
        };
        record.status = self.mode.snapshot(&record);
        self.records.push(record);
        self.selected = Some(id);
        self.view = MapView { lat: hit.lat, lng: hit.lon, zoom: SELECTED_ZOOM };
        let last = self.records.len() - 1;
        &self.records[last]
    }

    /// Append a hand-entered record with a fresh id. Returns the stored record.
    pub fn add_facility(&mut self, mut record: Facility) -> &Facility {
        record.id = self.allocate_id();
        record.status = self.mode.snapshot(&record);
        self.records.push(record);
        let last = self.records.len() - 1;
        &self.records[last]
    }

    /// Merge imported baseline records. An incoming record updates an
    /// existing one when both carry the same `source_ref`, or when neither
    /// does and they sit at the same coordinates. Names never identify a
    /// record: two POIs may share one, or both be unnamed. Everything else
    /// is appended with a fresh id. With `replace`, the book is cleared
    /// first. Returns `(added, updated)`.
    pub fn merge_baseline(&mut self, incoming: Vec<Facility>, replace: bool) -> (usize, usize) {
        if replace {
            self.records.clear();
            self.selected = None;
        }
        let (mut added, mut updated) = (0, 0);
        for mut record in incoming {
            if let Some(existing) = self.records.iter_mut().find(|r| same_place(r, &record)) {
                existing.name = record.name;
                existing.lat = record.lat;
                existing.lng = record.lng;
                existing.category = record.category;
                existing.details = record.details;
                existing.last_updated = record.last_updated;
                updated += 1;
                continue;
            }
            record.id = self.allocate_id();
            record.status = self.mode.snapshot(&record);
            self.records.push(record);
            added += 1;
        }
        (added, updated)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for LocationBook {
    fn default() -> Self {
        Self::with_samples()
    }
}

fn same_place(existing: &Facility, incoming: &Facility) -> bool {
    match (&existing.source_ref, &incoming.source_ref) {
        (Some(a), Some(b)) => a == b,
        (None, None) => {
            (existing.lat - incoming.lat).abs() < SAME_PLACE_EPSILON
                && (existing.lng - incoming.lng).abs() < SAME_PLACE_EPSILON
        }
        _ => false,
    }
}

/// Rewrite every record's active status from the snapshot `mode` selects.
pub fn project(records: &mut [Facility], mode: DisplayMode) {
    for record in records {
        record.status = mode.snapshot(record);
    }
}

#[cfg(test)]
#[path = "locations_test.rs"]
mod tests;
