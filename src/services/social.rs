//! Social monitor — posts pulled from social platforms for triage.
//!
//! DESIGN
//! ======
//! The monitor holds posts in memory (initially the samples). Posts added
//! at runtime get a relevance score and a location mention derived from
//! their text. A post can be promoted into a post-disaster update, which is
//! then stored like any field report.

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::clients::types::{ClientError, DisasterQuery, SocialFetchResponse, SocialPostInput};
use crate::error::ErrorCode;
use crate::model::{Facility, Platform, SocialPost, UpdateRecord, UpdateSource, UpdateStatus};
use crate::services::feed::{self, FeedError, StoredUpdate};
use crate::state::AppState;

/// Terms that make a post more likely to describe disaster impact.
const DISASTER_KEYWORDS: [&str; 16] = [
    "collapse",
    "destroyed",
    "damage",
    "flood",
    "earthquake",
    "fire",
    "injured",
    "trapped",
    "rescue",
    "evacuat",
    "emergency",
    "shelter",
    "outage",
    "blocked",
    "caved",
    "missing",
];

const BASE_RELEVANCE: f64 = 0.1;
const KEYWORD_WEIGHT: f64 = 0.15;
const MEDIA_BONUS: f64 = 0.1;

/// Location prepositions recognised by the mention extractor.
const LOCATION_CUES: [&str; 3] = ["at", "near", "in"];
const MAX_MENTION_WORDS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("post not found: {0}")]
    NotFound(u64),
    #[error("invalid post: {0}")]
    InvalidPost(&'static str),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Upstream(#[from] ClientError),
}

impl ErrorCode for SocialError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_POST_NOT_FOUND",
            Self::InvalidPost(_) => "E_INVALID_POST",
            Self::Feed(e) => e.error_code(),
            Self::Upstream(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Feed(e) => e.retryable(),
            Self::Upstream(e) => e.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// DERIVATION
// =============================================================================

/// Keyword relevance in `0.0..=1.0`, rounded to two decimals.
#[must_use]
pub fn relevance_score(content: &str, has_media: bool) -> f64 {
    let text = content.to_lowercase();
    let hits = DISASTER_KEYWORDS.iter().filter(|k| text.contains(**k)).count();
    let mut score = BASE_RELEVANCE + KEYWORD_WEIGHT * f64::from(u32::try_from(hits).unwrap_or(u32::MAX));
    if has_media {
        score += MEDIA_BONUS;
    }
    (score.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// A known facility name mentioned in `content`, else the capitalised words
/// following "at", "near", or "in".
#[must_use]
pub fn extract_location(content: &str, known_names: &[String]) -> Option<String> {
    let text = content.to_lowercase();
    if let Some(name) = known_names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .find(|n| text.contains(&n.to_lowercase()))
    {
        return Some(name.clone());
    }

    let words: Vec<&str> = content.split_whitespace().collect();
    for (idx, word) in words.iter().enumerate() {
        if !LOCATION_CUES.contains(&word.to_lowercase().as_str()) {
            continue;
        }
        let mut mention: Vec<&str> = Vec::new();
        for next in words.iter().skip(idx + 1).take(MAX_MENTION_WORDS) {
            let cleaned = next.trim_end_matches(|c: char| !c.is_alphanumeric());
            if !cleaned.chars().next().is_some_and(char::is_uppercase) {
                break;
            }
            mention.push(cleaned);
            if cleaned.len() != next.len() {
                break;
            }
        }
        if !mention.is_empty() {
            return Some(mention.join(" "));
        }
    }
    None
}

/// Status implied by the post's wording.
#[must_use]
pub fn infer_status(content: &str) -> UpdateStatus {
    let text = content.to_lowercase();
    let has = |terms: &[&str]| terms.iter().any(|t| text.contains(*t));
    if has(&["collapse", "destroyed"]) {
        UpdateStatus::Destroyed
    } else if has(&["damage", "caved", "flood"]) {
        UpdateStatus::Damaged
    } else if has(&["open", "operational"]) {
        UpdateStatus::Operational
    } else {
        UpdateStatus::Unknown
    }
}

fn infer_category(content: &str) -> &'static str {
    let text = content.to_lowercase();
    [
        ("hospital", "hospital"),
        ("clinic", "hospital"),
        ("school", "school"),
        ("shelter", "shelter"),
        ("bridge", "infrastructure"),
        ("road", "infrastructure"),
        ("power", "infrastructure"),
    ]
    .into_iter()
    .find_map(|(term, category)| text.contains(term).then_some(category))
    .unwrap_or("other")
}

/// Convert a post into an unstored update. Coordinates come from a facility
/// with the mentioned name, else `0, 0`.
#[must_use]
pub fn to_update(post: &SocialPost, facilities: &[Facility], now: OffsetDateTime) -> UpdateRecord {
    let location_name = post.location_mention.clone().unwrap_or_else(|| "Unknown location".into());
    let key = location_name.to_lowercase();
    let (latitude, longitude) = facilities
        .iter()
        .find(|f| f.name.to_lowercase() == key)
        .map_or((0.0, 0.0), |f| (f.lat, f.lng));

    UpdateRecord {
        id: feed::new_update_id(now),
        location_name,
        category: infer_category(&post.content).into(),
        status: infer_status(&post.content),
        latitude,
        longitude,
        details: post.content.clone(),
        reported_by: post.user_handle.clone(),
        reported_at: post.timestamp,
        source: UpdateSource::Social,
        has_image: post.has_media,
        verified: post.verified,
    }
}

#[must_use]
pub fn to_rag_input(post: &SocialPost) -> SocialPostInput {
    SocialPostInput {
        content: post.content.clone(),
        platform: post.platform.as_str().into(),
        username: Some(post.user_handle.clone()),
        tags: (!post.tags.is_empty()).then(|| post.tags.clone()),
    }
}

// =============================================================================
// MONITOR
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SocialFilter {
    /// Matches content or location mention, ignoring case.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub verified_only: bool,
    #[serde(default)]
    pub saved_only: bool,
}

/// Payload for a manually added post.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPost {
    pub platform: String,
    pub username: String,
    #[serde(default)]
    pub user_handle: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub has_media: bool,
}

#[derive(Debug, Clone)]
pub struct SocialMonitor {
    posts: Vec<SocialPost>,
    next_id: u64,
}

impl SocialMonitor {
    #[must_use]
    pub fn new(posts: Vec<SocialPost>) -> Self {
        let next_id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self { posts, next_id }
    }

    #[must_use]
    pub fn with_samples() -> Self {
        Self::new(crate::samples::social_posts())
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&SocialPost> {
        self.posts.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn filter(&self, filter: &SocialFilter) -> Vec<SocialPost> {
        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self.posts
            .iter()
            .filter(|p| {
                needle.as_ref().is_none_or(|n| {
                    p.content.to_lowercase().contains(n)
                        || p.location_mention.as_ref().is_some_and(|m| m.to_lowercase().contains(n))
                })
            })
            .filter(|p| !filter.verified_only || p.verified)
            .filter(|p| !filter.saved_only || p.saved)
            .cloned()
            .collect()
    }

    /// Flip the saved flag.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::NotFound`] for an unknown id.
    pub fn toggle_saved(&mut self, id: u64) -> Result<&SocialPost, SocialError> {
        let post = self.get_mut(id)?;
        post.saved = !post.saved;
        Ok(post)
    }

    /// # Errors
    ///
    /// Returns [`SocialError::NotFound`] for an unknown id.
    pub fn set_verified(&mut self, id: u64, verified: bool) -> Result<&SocialPost, SocialError> {
        let post = self.get_mut(id)?;
        post.verified = verified;
        Ok(post)
    }

    /// Add a post, deriving its relevance and location mention.
    ///
    /// # Errors
    ///
    /// Returns [`SocialError::InvalidPost`] for blank content or username.
    pub fn add_post(
        &mut self,
        input: NewPost,
        known_names: &[String],
        now: OffsetDateTime,
    ) -> Result<&SocialPost, SocialError> {
        if input.content.trim().is_empty() {
            return Err(SocialError::InvalidPost("content is required"));
        }
        if input.username.trim().is_empty() {
            return Err(SocialError::InvalidPost("username is required"));
        }

        let id = self.next_id;
        self.next_id += 1;
        let user_handle = input
            .user_handle
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| format!("@{}", input.username.trim().to_lowercase().replace(' ', "_")));
        let post = SocialPost {
            id,
            platform: Platform::parse_lenient(&input.platform),
            username: input.username.trim().to_string(),
            user_handle,
            relevance_score: relevance_score(&input.content, input.has_media),
            location_mention: extract_location(&input.content, known_names),
            content: input.content,
            timestamp: now,
            tags: input.tags,
            has_media: input.has_media,
            verified: false,
            saved: false,
        };
        self.posts.insert(0, post);
        Ok(&self.posts[0])
    }

    /// Drop a post, returning it if it existed.
    pub fn remove(&mut self, id: u64) -> Option<SocialPost> {
        let idx = self.posts.iter().position(|p| p.id == id)?;
        Some(self.posts.remove(idx))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut SocialPost, SocialError> {
        self.posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SocialError::NotFound(id))
    }
}

impl Default for SocialMonitor {
    fn default() -> Self {
        Self::with_samples()
    }
}

// =============================================================================
// FLOWS
// =============================================================================

/// Add a post to the monitor and mirror it into the RAG store.
///
/// # Errors
///
/// Returns an error for an invalid post or a failed store call. A post that
/// fails to store is removed from the monitor again.
pub async fn add_post(state: &AppState, input: NewPost) -> Result<SocialPost, SocialError> {
    let known: Vec<String> = state.locations.read().await.records().iter().map(|r| r.name.clone()).collect();
    let post = state
        .social
        .write()
        .await
        .add_post(input, &known, OffsetDateTime::now_utc())?
        .clone();

    let ack = match state.clients.rag.add_social(&to_rag_input(&post)).await {
        Ok(ack) => ack,
        Err(e) => {
            state.social.write().await.remove(post.id);
            warn!(id = post.id, error = %e, "social post not stored, rolled back");
            return Err(e.into());
        }
    };
    info!(id = post.id, doc = %ack.id, relevance = post.relevance_score, "social post stored");
    Ok(post)
}

/// Convert a post into an update and store it.
///
/// # Errors
///
/// Returns [`SocialError::NotFound`] for an unknown id, or the store error.
pub async fn promote(state: &AppState, id: u64) -> Result<StoredUpdate, SocialError> {
    let post = state.social.read().await.get(id).cloned().ok_or(SocialError::NotFound(id))?;
    let update = {
        let book = state.locations.read().await;
        to_update(&post, book.records(), OffsetDateTime::now_utc())
    };
    let stored = feed::store_update(state, update).await?;
    info!(post = id, doc = %stored.id, "social post promoted to update");
    Ok(stored)
}

/// Ask the social agent to fetch and store posts for an event.
///
/// # Errors
///
/// Returns the agent's error.
pub async fn fetch(state: &AppState, query: &DisasterQuery) -> Result<SocialFetchResponse, SocialError> {
    let response = state.clients.social.fetch_social_data(query).await?;
    info!(event = %query.event_name, stored = response.stored_count, "social data fetched");
    Ok(response)
}

#[cfg(test)]
#[path = "social_test.rs"]
mod tests;
