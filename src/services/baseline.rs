//! Pre-disaster baseline — OSM points of interest as map facilities.
//!
//! DESIGN
//! ======
//! A collection job gathers POIs for a named location, grouped by
//! structure type: `{ "poi_data": { "hospital": [ {name, latitude,
//! longitude, details}, ... ], ... } }`. Each POI with numeric coordinates
//! becomes a facility whose pre- and post-disaster statuses are both
//! operational. Imports merge into the location book by upstream id, or by
//! coordinates when a POI has none.
//!
//! The facility database is a tabular view over the same records: search
//! by name, filter by category, sort on any column, paginate. Operators can
//! also enter facilities by hand.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::clients::types::{ClientError, CollectRequest, JobState};
use crate::error::ErrorCode;
use crate::model::{Facility, FacilityCategory, FacilityStatus, Priority};
use crate::services::feed::SortOrder;
use crate::services::jobs::{self, JobError, JobKind, JobProgress};
use crate::state::AppState;

const NO_DETAILS: &str = "No details available";
/// Rows per page in the facility database.
pub const DEFAULT_TABLE_PER_PAGE: usize = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BaselineError {
    #[error("invalid facility: {0}")]
    InvalidFacility(&'static str),
    #[error("unknown facility type: {0}")]
    UnknownCategory(String),
}

impl ErrorCode for BaselineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFacility(_) => "E_INVALID_FACILITY",
            Self::UnknownCategory(_) => "E_UNKNOWN_CATEGORY",
        }
    }
}

/// Map category for an OSM structure type. Unmapped types land on `Other`.
#[must_use]
pub fn category_for(structure_type: &str) -> FacilityCategory {
    match structure_type {
        "hospital" => FacilityCategory::Hospital,
        "school" => FacilityCategory::School,
        "shelter" => FacilityCategory::Shelter,
        "fire_station" | "police" | "power" => FacilityCategory::Infrastructure,
        "water" => FacilityCategory::WaterSource,
        "bridge" => FacilityCategory::Bridge,
        _ => FacilityCategory::Other,
    }
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert a collection result into facilities. Ids are left at zero for
/// the location book to assign.
#[must_use]
pub fn convert_osm(data: &serde_json::Value, now: OffsetDateTime) -> Vec<Facility> {
    let Some(groups) = data.get("poi_data").and_then(serde_json::Value::as_object) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (structure_type, pois) in groups {
        let Some(pois) = pois.as_array() else {
            continue;
        };
        let category = category_for(structure_type);
        for poi in pois {
            let (Some(lat), Some(lng)) = (
                poi.get("latitude").and_then(serde_json::Value::as_f64),
                poi.get("longitude").and_then(serde_json::Value::as_f64),
            ) else {
                continue;
            };
            let text = |key: &str| {
                poi.get(key)
                    .and_then(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            let last_updated = text("lastUpdated")
                .and_then(|s| OffsetDateTime::parse(&s, &Rfc3339).ok())
                .unwrap_or(now);
            let source_ref = match poi.get("id") {
                Some(serde_json::Value::Number(n)) => Some(format!("osm:{n}")),
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(format!("osm:{}", s.trim())),
                _ => None,
            };

            out.push(Facility {
                id: 0,
                name: text("name").unwrap_or_else(|| format!("Unnamed {}", capitalise(structure_type))),
                lat,
                lng,
                category,
                status: FacilityStatus::Operational,
                pre_status: FacilityStatus::Operational,
                post_status: FacilityStatus::Operational,
                priority: Priority::Medium,
                details: text("details").unwrap_or_else(|| NO_DETAILS.into()),
                last_updated,
                source_ref,
            });
        }
    }
    out
}

/// Per-category collection progress shown while a baseline job runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StructureProgress {
    pub hospitals: f64,
    pub schools: f64,
    pub infrastructure: f64,
    pub shelters: f64,
    pub water_sources: f64,
}

impl StructureProgress {
    fn uniform(value: f64) -> Self {
        Self { hospitals: value, schools: value, infrastructure: value, shelters: value, water_sources: value }
    }
}

/// Boundary collection finishes before POIs, so every category shows full
/// once it is reached. POI collection is scaled up by half.
#[must_use]
pub fn structure_progress(status: &JobState, progress: f64) -> StructureProgress {
    let base = progress.clamp(0.0, 100.0);
    match status {
        JobState::Completed | JobState::CollectingBoundary => StructureProgress::uniform(100.0),
        JobState::CollectingPoi => StructureProgress::uniform((base * 1.5).min(100.0)),
        _ => StructureProgress::uniform(base),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
}

/// Import request: a collection result, optionally replacing the map.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub data: serde_json::Value,
    #[serde(default)]
    pub replace: bool,
}

/// Convert and merge `data` into the location book.
pub async fn import(state: &AppState, data: &serde_json::Value, replace: bool) -> ImportSummary {
    let records = convert_osm(data, OffsetDateTime::now_utc());
    let converted = records.len();
    let (added, updated) = state.locations.write().await.merge_baseline(records, replace);
    info!(converted, added, updated, replace, "baseline imported");
    ImportSummary { added, updated }
}

// =============================================================================
// DATABASE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSortKey {
    #[default]
    Name,
    #[serde(alias = "type")]
    Category,
    Lat,
    Lng,
    Priority,
    Status,
    LastUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityTableQuery {
    /// Case-insensitive substring of the facility name.
    pub search: Option<String>,
    /// Empty means every category.
    pub categories: Vec<FacilityCategory>,
    pub sort: TableSortKey,
    pub order: SortOrder,
    pub page: usize,
    pub per_page: usize,
}

impl Default for FacilityTableQuery {
    fn default() -> Self {
        Self {
            search: None,
            categories: Vec::new(),
            sort: TableSortKey::default(),
            order: SortOrder::Asc,
            page: 0,
            per_page: DEFAULT_TABLE_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityTable {
    /// Matches before pagination.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub facilities: Vec<Facility>,
}

/// Filter, sort, and paginate facility records.
#[must_use]
pub fn table(records: &[Facility], query: &FacilityTableQuery) -> FacilityTable {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut matched: Vec<&Facility> = records
        .iter()
        .filter(|r| needle.as_ref().is_none_or(|n| r.name.to_lowercase().contains(n)))
        .filter(|r| query.categories.is_empty() || query.categories.contains(&r.category))
        .collect();

    matched.sort_by(|a, b| {
        let ord = compare(a, b, query.sort).then_with(|| a.id.cmp(&b.id));
        match query.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let per_page = query.per_page.max(1);
    let facilities = matched
        .iter()
        .skip(query.page.saturating_mul(per_page))
        .take(per_page)
        .map(|r| (*r).clone())
        .collect();
    FacilityTable { total: matched.len(), page: query.page, per_page, facilities }
}

fn compare(a: &Facility, b: &Facility, key: TableSortKey) -> Ordering {
    match key {
        TableSortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        TableSortKey::Category => a.category.as_str().cmp(b.category.as_str()),
        TableSortKey::Lat => a.lat.total_cmp(&b.lat),
        TableSortKey::Lng => a.lng.total_cmp(&b.lng),
        TableSortKey::Priority => a.priority.cmp(&b.priority),
        TableSortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        TableSortKey::LastUpdated => a.last_updated.cmp(&b.last_updated),
    }
}

/// Parse a comma-separated category filter.
///
/// # Errors
///
/// Returns [`BaselineError::UnknownCategory`] for a name that is not a layer.
pub fn parse_categories(raw: &str) -> Result<Vec<FacilityCategory>, BaselineError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| FacilityCategory::parse(name).ok_or_else(|| BaselineError::UnknownCategory(name.to_string())))
        .collect()
}

/// Hand-entered facility.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewFacility {
    pub name: String,
    #[serde(rename = "type")]
    pub category: FacilityCategory,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub details: String,
    #[serde(default = "medium_priority")]
    pub priority: Priority,
}

fn medium_priority() -> Priority {
    Priority::Medium
}

impl NewFacility {
    /// Validate and build an operational record. The id is assigned on insert.
    ///
    /// # Errors
    ///
    /// Returns [`BaselineError::InvalidFacility`] for a blank name,
    /// out-of-range coordinates, or the search-result category.
    pub fn into_facility(self, now: OffsetDateTime) -> Result<Facility, BaselineError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BaselineError::InvalidFacility("name is required"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(BaselineError::InvalidFacility("latitude must be within -90..=90"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(BaselineError::InvalidFacility("longitude must be within -180..=180"));
        }
        if self.category == FacilityCategory::SearchResult {
            return Err(BaselineError::InvalidFacility("search_result is reserved for geocoded places"));
        }
        let details = self.details.trim();
        Ok(Facility {
            id: 0,
            name: name.to_string(),
            lat: self.latitude,
            lng: self.longitude,
            category: self.category,
            status: FacilityStatus::Operational,
            pre_status: FacilityStatus::Operational,
            post_status: FacilityStatus::Operational,
            priority: self.priority,
            details: if details.is_empty() { NO_DETAILS.into() } else { details.to_string() },
            last_updated: now,
            source_ref: None,
        })
    }
}

/// Validate and add a hand-entered facility to the location book.
///
/// # Errors
///
/// Returns an error if the entry fails validation.
pub async fn add_facility(state: &AppState, entry: NewFacility) -> Result<Facility, BaselineError> {
    let record = entry.into_facility(OffsetDateTime::now_utc())?;
    let stored = state.locations.write().await.add_facility(record).clone();
    info!(id = stored.id, name = %stored.name, category = stored.category.as_str(), "facility added");
    Ok(stored)
}

/// Start a collection job for `request.location` and watch it. On
/// completion its POIs are merged into the map.
///
/// # Errors
///
/// Returns an error for a blank location or a failed submission.
pub async fn collect(state: &AppState, request: CollectRequest) -> Result<JobProgress, JobError> {
    let location = request.location.trim();
    if location.is_empty() {
        return Err(ClientError::InvalidRequest("location is required".into()).into());
    }
    let request = CollectRequest { location: location.to_owned(), structures: request.structures };
    let ticket = state.clients.jobs.collect_location(&request).await?;
    Ok(jobs::watch(state, ticket, JobKind::Baseline).await)
}

#[cfg(test)]
#[path = "baseline_test.rs"]
mod tests;
