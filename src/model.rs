//! Display records shared by the map, feed, social monitor, and reports.
//!
//! DESIGN
//! ======
//! These types mirror what the dashboard renders. None of them are
//! persisted here: updates and posts round-trip through the external RAG
//! store, facilities live in `AppState` for the lifetime of the process.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// STATUS
// =============================================================================

/// Condition of a facility as shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityStatus {
    Operational,
    Damaged,
    Destroyed,
}

impl FacilityStatus {
    pub const ALL: [Self; 3] = [Self::Operational, Self::Damaged, Self::Destroyed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Damaged => "damaged",
            Self::Destroyed => "destroyed",
        }
    }
}

/// Status carried by a field/social/news update. Unlike facilities, an
/// update may not know the condition of the place it reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Operational,
    Damaged,
    Destroyed,
    Unknown,
}

impl UpdateStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Damaged => "damaged",
            Self::Destroyed => "destroyed",
            Self::Unknown => "unknown",
        }
    }

    /// Lenient parse used for free-text blocks. Anything unrecognised is `Unknown`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "operational" => Self::Operational,
            "damaged" => Self::Damaged,
            "destroyed" => Self::Destroyed,
            _ => Self::Unknown,
        }
    }
}

impl From<FacilityStatus> for UpdateStatus {
    fn from(status: FacilityStatus) -> Self {
        match status {
            FacilityStatus::Operational => Self::Operational,
            FacilityStatus::Damaged => Self::Damaged,
            FacilityStatus::Destroyed => Self::Destroyed,
        }
    }
}

// =============================================================================
// FACILITY
// =============================================================================

/// Map layer a facility belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityCategory {
    Hospital,
    School,
    Shelter,
    Infrastructure,
    Bridge,
    WaterSource,
    /// Imported structure types with no dedicated layer.
    Other,
    /// Synthetic records created from geocoding search results. Never
    /// hidden by the layer filter.
    SearchResult,
}

impl FacilityCategory {
    /// Layers shown when the map first loads.
    pub const DEFAULT_LAYERS: [Self; 7] = [
        Self::Hospital,
        Self::School,
        Self::Shelter,
        Self::Infrastructure,
        Self::Bridge,
        Self::WaterSource,
        Self::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::School => "school",
            Self::Shelter => "shelter",
            Self::Infrastructure => "infrastructure",
            Self::Bridge => "bridge",
            Self::WaterSource => "water_source",
            Self::Other => "other",
            Self::SearchResult => "search_result",
        }
    }

    /// Inverse of [`Self::as_str`], ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        [
            Self::Hospital,
            Self::School,
            Self::Shelter,
            Self::Infrastructure,
            Self::Bridge,
            Self::WaterSource,
            Self::Other,
            Self::SearchResult,
        ]
        .into_iter()
        .find(|c| c.as_str() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// A point of interest tracked on the map.
///
/// `status` is the active projection of either `pre_status` or
/// `post_status`, depending on the map's [`DisplayMode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: u64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub category: FacilityCategory,
    pub status: FacilityStatus,
    pub pre_status: FacilityStatus,
    pub post_status: FacilityStatus,
    pub priority: Priority,
    pub details: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    /// Upstream identity of an imported record, e.g. `osm:node/123`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

/// Which snapshot the map is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Pre,
    Post,
}

impl DisplayMode {
    /// The snapshot of `facility` that this mode displays.
    #[must_use]
    pub fn snapshot(self, facility: &Facility) -> FacilityStatus {
        match self {
            Self::Pre => facility.pre_status,
            Self::Post => facility.post_status,
        }
    }
}

// =============================================================================
// UPDATE
// =============================================================================

/// Channel an update arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Field,
    Social,
    News,
    Official,
}

impl UpdateSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Social => "social",
            Self::News => "news",
            Self::Official => "official",
        }
    }

    /// Lenient parse used for free-text blocks. Unknown channels count as field reports.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "social" => Self::Social,
            "news" => Self::News,
            "official" => Self::Official,
            _ => Self::Field,
        }
    }
}

/// A post-disaster report about one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub id: u64,
    pub location_name: String,
    /// Free-form category (`hospital`, `school`, `road`, ...). Forms accept
    /// anything, so this is not restricted to map layers.
    pub category: String,
    pub status: UpdateStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub details: String,
    pub reported_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub reported_at: OffsetDateTime,
    pub source: UpdateSource,
    pub has_image: bool,
    pub verified: bool,
}

// =============================================================================
// SOCIAL POST
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Twitter,
    Facebook,
    Instagram,
    #[serde(other)]
    Other,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "twitter" | "x" => Self::Twitter,
            "facebook" => Self::Facebook,
            "instagram" => Self::Instagram,
            _ => Self::Other,
        }
    }
}

/// A social media post held by the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: u64,
    pub platform: Platform,
    pub username: String,
    pub user_handle: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Derived score in `0.0..=1.0`.
    pub relevance_score: f64,
    /// Derived location name, if the post mentions one.
    pub location_mention: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub has_media: bool,
    pub verified: bool,
    pub saved: bool,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
