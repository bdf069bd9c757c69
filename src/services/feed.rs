//! Feed service — post-disaster updates in and out of the RAG store.
//!
//! DESIGN
//! ======
//! Updates are stored as a human-readable text block (what the embedding
//! sees) plus a JSON envelope in the `context` field carrying the typed
//! record. Reading the feed back prefers the envelope; blocks written
//! before the envelope existed go through a line-prefix parser.
//!
//! FALLBACK
//! ========
//! A failed query or a batch that parses to nothing yields the sample
//! updates plus a warning notice. The feed never comes back empty.
//!
//! ```text
//! Location: Central Hospital (40.712, -74.006)
//! Type: hospital
//! Status: damaged
//! Details: East wing structural damage
//! Reported by: field_team_3
//! Source: field
//! Verified: Yes
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{info, warn};

use crate::clients::types::{
    AddResponse, COLLECTION_NEWS, COLLECTION_USER_INPUTS, ClientError, NewsItem, QueryHit, QueryRequest, UserInput,
};
use crate::error::ErrorCode;
use crate::model::{UpdateRecord, UpdateSource, UpdateStatus};
use crate::services::notices::Severity;
use crate::state::AppState;

/// `kind` marker of an update envelope.
pub const UPDATE_KIND: &str = "post_disaster_update";
/// Maximum hits requested for the shared feed.
pub const FEED_LIMIT: usize = 15;
pub const DEFAULT_PER_PAGE: usize = 5;
pub const MANUAL_NEWS_SOURCE: &str = "manual_entry";

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("invalid update: {0}")]
    InvalidUpdate(&'static str),
    #[error("invalid news item: {0}")]
    InvalidNews(&'static str),
    #[error("update encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Upstream(#[from] ClientError),
}

impl ErrorCode for FeedError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUpdate(_) => "E_INVALID_UPDATE",
            Self::InvalidNews(_) => "E_INVALID_NEWS",
            Self::Encode(_) => "E_ENCODE",
            Self::Upstream(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Upstream(e) if e.retryable())
    }
}

// =============================================================================
// STORAGE FORMAT
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    kind: String,
    tag: String,
    record: UpdateRecord,
}

/// Legacy context tag, kept inside the envelope for search filters.
#[must_use]
pub fn context_tag(update: &UpdateRecord) -> String {
    format!("{UPDATE_KIND}_{}_{}", update.category, update.status.as_str())
}

/// The text block stored as the document body.
#[must_use]
pub fn format_update_block(update: &UpdateRecord) -> String {
    format!(
        "Location: {} ({}, {})\nType: {}\nStatus: {}\nDetails: {}\nReported by: {}\nSource: {}\nVerified: {}",
        update.location_name,
        update.latitude,
        update.longitude,
        update.category,
        update.status.as_str(),
        update.details,
        update.reported_by,
        update.source.as_str(),
        if update.verified { "Yes" } else { "No" },
    )
}

/// Build the `/add/user` payload for an update.
///
/// # Errors
///
/// Returns an error if the record cannot be encoded as JSON.
pub fn to_user_input(update: &UpdateRecord) -> Result<UserInput, serde_json::Error> {
    let envelope = Envelope { kind: UPDATE_KIND.into(), tag: context_tag(update), record: update.clone() };
    Ok(UserInput {
        content: format_update_block(update),
        user_id: Some(update.reported_by.clone()),
        context: Some(serde_json::to_string(&envelope)?),
    })
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse every hit that describes an update. Unparseable hits are dropped.
/// Legacy records get ids `1..` in hit order.
#[must_use]
pub fn parse_hits(hits: &[QueryHit], now: OffsetDateTime) -> Vec<UpdateRecord> {
    hits.iter()
        .filter_map(|hit| parse_hit(hit, now))
        .enumerate()
        .map(|(idx, (mut record, from_envelope))| {
            if !from_envelope {
                record.id = idx as u64 + 1;
            }
            record
        })
        .collect()
}

/// Parse one hit. The flag is `true` when the record came from an envelope.
fn parse_hit(hit: &QueryHit, now: OffsetDateTime) -> Option<(UpdateRecord, bool)> {
    if let Some(record) = hit
        .metadata
        .get("context")
        .and_then(serde_json::Value::as_str)
        .and_then(parse_envelope)
    {
        return Some((record, true));
    }

    let reported_at = hit
        .metadata
        .get("timestamp")
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or(now);
    parse_block(&hit.content, reported_at).map(|r| (r, false))
}

fn parse_envelope(raw: &str) -> Option<UpdateRecord> {
    let envelope: Envelope = serde_json::from_str(raw).ok()?;
    (envelope.kind == UPDATE_KIND).then_some(envelope.record)
}

/// RFC 3339, or a naive ISO 8601 stamp read as UTC.
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .or_else(|| PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).ok().map(PrimitiveDateTime::assume_utc))
}

/// Parse a legacy text block. Returns `None` without a `Location:` or
/// `Type:` line.
#[must_use]
pub fn parse_block(content: &str, reported_at: OffsetDateTime) -> Option<UpdateRecord> {
    let mut location = None;
    let mut category = None;
    let mut status = UpdateStatus::Unknown;
    let mut details = String::new();
    let mut reported_by = String::new();
    let mut source = UpdateSource::Field;
    let mut verified = false;

    for line in content.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Location:") {
            location = Some(parse_location(rest.trim()));
        } else if let Some(rest) = line.strip_prefix("Type:") {
            category = Some(rest.trim().to_string()).filter(|c| !c.is_empty());
        } else if let Some(rest) = line.strip_prefix("Status:") {
            status = UpdateStatus::parse_lenient(rest);
        } else if let Some(rest) = line.strip_prefix("Details:") {
            details = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Reported by:") {
            reported_by = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Source:") {
            source = UpdateSource::parse_lenient(rest);
        } else if let Some(rest) = line.strip_prefix("Verified:") {
            verified = rest.trim().eq_ignore_ascii_case("yes");
        }
    }

    let (location_name, latitude, longitude) = location?;
    if location_name.is_empty() {
        return None;
    }
    Some(UpdateRecord {
        id: 0,
        location_name,
        category: category?,
        status,
        latitude,
        longitude,
        details,
        reported_by,
        reported_at,
        source,
        has_image: false,
        verified,
    })
}

/// `Name (lat, lng)`. Missing or malformed coordinates become `0, 0` and
/// the whole value is the name.
fn parse_location(raw: &str) -> (String, f64, f64) {
    let coords = raw
        .strip_suffix(')')
        .and_then(|s| s.rsplit_once('('))
        .and_then(|(name, inner)| {
            let (lat, lng) = inner.split_once(',')?;
            Some((name.trim(), lat.trim().parse().ok()?, lng.trim().parse().ok()?))
        });
    match coords {
        Some((name, lat, lng)) => (name.to_string(), lat, lng),
        None => (raw.to_string(), 0.0, 0.0),
    }
}

// =============================================================================
// INGEST
// =============================================================================

/// Why the feed is showing sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    ServiceUnreachable,
    EmptyResult,
    Unknown,
}

impl FallbackReason {
    #[must_use]
    pub fn from_error(err: &ClientError) -> Self {
        match err {
            ClientError::Request(_) | ClientError::Status { .. } => Self::ServiceUnreachable,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::ServiceUnreachable => "Could not reach the knowledge base. Showing sample updates.",
            Self::EmptyResult => "No updates found in the knowledge base. Showing sample updates.",
            Self::Unknown => "Failed to read updates. Showing sample updates.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedBatch {
    pub updates: Vec<UpdateRecord>,
    pub fallback: Option<FallbackReason>,
}

/// Turn a query result into a batch, substituting samples on failure.
#[must_use]
pub fn ingest(result: Result<Vec<QueryHit>, ClientError>, now: OffsetDateTime) -> FeedBatch {
    let reason = match result {
        Ok(hits) => {
            let updates = parse_hits(&hits, now);
            if !updates.is_empty() {
                return FeedBatch { updates, fallback: None };
            }
            FallbackReason::EmptyResult
        }
        Err(e) => FallbackReason::from_error(&e),
    };
    FeedBatch { updates: crate::samples::updates(), fallback: Some(reason) }
}

/// Query the shared feed and parse it. Fallbacks post a warning notice.
pub async fn load_feed(state: &AppState) -> FeedBatch {
    let request = QueryRequest {
        query: state.config.feed_query.clone(),
        collections: vec![COLLECTION_USER_INPUTS.into(), COLLECTION_NEWS.into()],
        limit: FEED_LIMIT,
    };
    let result = state.clients.rag.query(&request).await.map(|r| r.results);
    if let Err(e) = &result {
        warn!(error = %e, "feed query failed");
    }

    let batch = ingest(result, OffsetDateTime::now_utc());
    match batch.fallback {
        Some(reason) => {
            warn!(?reason, "feed falling back to sample updates");
            state.notify(Severity::Warning, reason.message()).await;
        }
        None => info!(count = batch.updates.len(), "feed loaded"),
    }
    batch
}

// =============================================================================
// VIEW
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    ReportedAt,
    LocationName,
    Status,
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    /// Case-insensitive substring of the location name.
    pub search: Option<String>,
    /// Empty means any status.
    pub statuses: Vec<UpdateStatus>,
    /// Empty means any source.
    pub sources: Vec<UpdateSource>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub page: usize,
    pub per_page: usize,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            search: None,
            statuses: Vec::new(),
            sources: Vec::new(),
            sort: SortKey::default(),
            order: SortOrder::default(),
            page: 0,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPage {
    /// Matches before pagination.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub updates: Vec<UpdateRecord>,
}

/// Filter, sort, and paginate.
#[must_use]
pub fn view(updates: &[UpdateRecord], query: &FeedQuery) -> FeedPage {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut matched: Vec<&UpdateRecord> = updates
        .iter()
        .filter(|u| needle.as_ref().is_none_or(|n| u.location_name.to_lowercase().contains(n)))
        .filter(|u| query.statuses.is_empty() || query.statuses.contains(&u.status))
        .filter(|u| query.sources.is_empty() || query.sources.contains(&u.source))
        .collect();

    matched.sort_by(|a, b| {
        let ord = compare(a, b, query.sort);
        match query.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let per_page = query.per_page.max(1);
    let updates = matched
        .iter()
        .skip(query.page.saturating_mul(per_page))
        .take(per_page)
        .map(|u| (*u).clone())
        .collect();
    FeedPage { total: matched.len(), page: query.page, per_page, updates }
}

fn compare(a: &UpdateRecord, b: &UpdateRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::ReportedAt => a.reported_at.cmp(&b.reported_at),
        SortKey::LocationName => a.location_name.to_lowercase().cmp(&b.location_name.to_lowercase()),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        SortKey::Source => a.source.as_str().cmp(b.source.as_str()),
    }
}

// =============================================================================
// WRITES
// =============================================================================

/// Form payload for a new update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewUpdate {
    pub location_name: String,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default = "unknown_status")]
    pub status: UpdateStatus,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub reported_by: String,
    #[serde(default = "field_source")]
    pub source: UpdateSource,
    #[serde(default)]
    pub has_image: bool,
    #[serde(default)]
    pub verified: bool,
}

fn unknown_status() -> UpdateStatus {
    UpdateStatus::Unknown
}

fn field_source() -> UpdateSource {
    UpdateSource::Field
}

impl NewUpdate {
    #[must_use]
    pub fn into_record(self, now: OffsetDateTime) -> UpdateRecord {
        UpdateRecord {
            id: new_update_id(now),
            location_name: self.location_name.trim().to_string(),
            category: self.category.trim().to_string(),
            status: self.status,
            latitude: self.latitude,
            longitude: self.longitude,
            details: self.details,
            reported_by: self.reported_by,
            reported_at: now,
            source: self.source,
            has_image: self.has_image,
            verified: self.verified,
        }
    }
}

/// Id for a newly created update: unix milliseconds.
#[must_use]
pub fn new_update_id(now: OffsetDateTime) -> u64 {
    u64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredUpdate {
    pub success: bool,
    pub id: String,
    pub update: UpdateRecord,
}

/// Store an update in the RAG store.
///
/// # Errors
///
/// Returns an error if the location or type is blank, or the store call fails.
pub async fn store_update(state: &AppState, update: UpdateRecord) -> Result<StoredUpdate, FeedError> {
    if update.location_name.trim().is_empty() {
        return Err(FeedError::InvalidUpdate("location name is required"));
    }
    if update.category.trim().is_empty() {
        return Err(FeedError::InvalidUpdate("type is required"));
    }

    let input = to_user_input(&update)?;
    let AddResponse { id, .. } = state.clients.rag.add_user_input(&input).await?;
    info!(%id, location = %update.location_name, status = update.status.as_str(), "update stored");
    Ok(StoredUpdate { success: true, id, update })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Store a manually entered news item. Blank source and url get
/// `manual_entry` and `manual://<unix-millis>`.
///
/// # Errors
///
/// Returns an error if the title or content is blank, or the store call fails.
pub async fn submit_news(state: &AppState, input: NewsInput) -> Result<AddResponse, FeedError> {
    if input.title.trim().is_empty() {
        return Err(FeedError::InvalidNews("title is required"));
    }
    if input.content.trim().is_empty() {
        return Err(FeedError::InvalidNews("content is required"));
    }

    let millis = new_update_id(OffsetDateTime::now_utc());
    let item = NewsItem {
        title: input.title,
        content: input.content,
        source: Some(non_blank(input.source).unwrap_or_else(|| MANUAL_NEWS_SOURCE.into())),
        url: Some(non_blank(input.url).unwrap_or_else(|| format!("manual://{millis}"))),
    };
    let response = state.clients.rag.add_news(&item).await?;
    info!(id = %response.id, title = %item.title, "news item stored");
    Ok(response)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
