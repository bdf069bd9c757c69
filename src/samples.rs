//! Known-good demo datasets.
//!
//! Every screen falls back to these when a collaborator is unreachable or a
//! query yields nothing usable, so the dashboard is never empty.

use time::OffsetDateTime;
use time::macros::datetime;

use crate::clients::types::{RecentReport, ReportKind};
use crate::model::{
    Facility, FacilityCategory, FacilityStatus, Platform, Priority, SocialPost, UpdateRecord, UpdateSource,
    UpdateStatus,
};

#[allow(clippy::too_many_arguments)]
fn facility(
    id: u64,
    name: &str,
    lat: f64,
    lng: f64,
    category: FacilityCategory,
    post_status: FacilityStatus,
    priority: Priority,
    details: &str,
    last_updated: OffsetDateTime,
) -> Facility {
    // Baseline snapshots are all operational.
    Facility {
        id,
        name: name.into(),
        lat,
        lng,
        category,
        status: FacilityStatus::Operational,
        pre_status: FacilityStatus::Operational,
        post_status,
        priority,
        details: details.into(),
        last_updated,
        source_ref: None,
    }
}

/// Facilities shown on the map before any search or import.
#[must_use]
pub fn facilities() -> Vec<Facility> {
    vec![
        facility(
            1,
            "Central Hospital",
            40.712,
            -74.006,
            FacilityCategory::Hospital,
            FacilityStatus::Damaged,
            Priority::High,
            "East wing structural damage, emergency room functional.",
            datetime!(2025-05-02 08:45 UTC),
        ),
        facility(
            2,
            "North School",
            40.718,
            -74.012,
            FacilityCategory::School,
            FacilityStatus::Damaged,
            Priority::Medium,
            "Gymnasium roof collapsed.",
            datetime!(2025-05-01 15:20 UTC),
        ),
        facility(
            3,
            "Main Bridge",
            40.710,
            -74.002,
            FacilityCategory::Bridge,
            FacilityStatus::Destroyed,
            Priority::Critical,
            "Complete structural failure, impassable.",
            datetime!(2025-05-01 12:35 UTC),
        ),
        facility(
            4,
            "Emergency Shelter",
            40.715,
            -74.008,
            FacilityCategory::Shelter,
            FacilityStatus::Operational,
            Priority::High,
            "Housing 87 people, supplies for 48 hours.",
            datetime!(2025-05-02 10:15 UTC),
        ),
        facility(
            5,
            "Power Plant",
            40.706,
            -74.015,
            FacilityCategory::Infrastructure,
            FacilityStatus::Damaged,
            Priority::Critical,
            "Grid output reduced, rolling outages in northern districts.",
            datetime!(2025-05-01 18:05 UTC),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn update(
    id: u64,
    location_name: &str,
    category: &str,
    status: UpdateStatus,
    (latitude, longitude): (f64, f64),
    details: &str,
    reported_by: &str,
    reported_at: OffsetDateTime,
    source: UpdateSource,
    has_image: bool,
    verified: bool,
) -> UpdateRecord {
    UpdateRecord {
        id,
        location_name: location_name.into(),
        category: category.into(),
        status,
        latitude,
        longitude,
        details: details.into(),
        reported_by: reported_by.into(),
        reported_at,
        source,
        has_image,
        verified,
    }
}

/// Post-disaster updates shown when the shared feed yields nothing.
#[must_use]
pub fn updates() -> Vec<UpdateRecord> {
    vec![
        update(
            1,
            "Central Hospital",
            "hospital",
            UpdateStatus::Damaged,
            (40.712, -74.006),
            "Structural damage to east wing, operating at 60% capacity. Emergency room still functional.",
            "field_team_3",
            datetime!(2025-05-02 08:45 UTC),
            UpdateSource::Field,
            true,
            true,
        ),
        update(
            2,
            "North Elementary School",
            "school",
            UpdateStatus::Damaged,
            (40.718, -74.012),
            "Roof collapsed in gymnasium. Main building appears intact but needs assessment.",
            "volunteer_sarah",
            datetime!(2025-05-01 15:20 UTC),
            UpdateSource::Field,
            true,
            false,
        ),
        update(
            3,
            "Main Bridge",
            "infrastructure",
            UpdateStatus::Destroyed,
            (40.710, -74.002),
            "Complete structural failure. Bridge has collapsed and is impassable.",
            "news_agency_1",
            datetime!(2025-05-01 12:35 UTC),
            UpdateSource::News,
            true,
            true,
        ),
        update(
            4,
            "Community Center",
            "shelter",
            UpdateStatus::Operational,
            (40.715, -74.008),
            "Functioning as emergency shelter. Currently housing 87 people. Supplies adequate for 48 hours.",
            "emergency_services",
            datetime!(2025-05-02 10:15 UTC),
            UpdateSource::Official,
            false,
            true,
        ),
        update(
            5,
            "Water Treatment Plant",
            "infrastructure",
            UpdateStatus::Damaged,
            (40.720, -74.010),
            "Partial function. Filtration systems compromised. Water safety is questionable.",
            "social_media_report",
            datetime!(2025-05-01 18:05 UTC),
            UpdateSource::Social,
            false,
            false,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn post(
    id: u64,
    platform: Platform,
    (username, user_handle): (&str, &str),
    content: &str,
    timestamp: OffsetDateTime,
    relevance_score: f64,
    location_mention: &str,
    (has_media, verified, saved): (bool, bool, bool),
) -> SocialPost {
    SocialPost {
        id,
        platform,
        username: username.into(),
        user_handle: user_handle.into(),
        content: content.into(),
        timestamp,
        relevance_score,
        location_mention: Some(location_mention.into()),
        tags: Vec::new(),
        has_media,
        verified,
        saved,
    }
}

/// Posts the social monitor starts with.
#[must_use]
pub fn social_posts() -> Vec<SocialPost> {
    vec![
        post(
            1,
            Platform::Twitter,
            ("Local News Network", "@localnews"),
            "BREAKING: Main Bridge has collapsed following the earthquake. Avoid downtown area. Emergency services are responding. #DisasterResponse",
            datetime!(2025-05-01 12:15 UTC),
            0.92,
            "Main Bridge",
            (true, true, true),
        ),
        post(
            2,
            Platform::Twitter,
            ("Sarah Johnson", "@sarah_j"),
            "Just passed by North Elementary School - roof of the gym has caved in. Rest of building looks ok from outside. #earthquake",
            datetime!(2025-05-01 12:35 UTC),
            0.85,
            "North Elementary School",
            (true, false, false),
        ),
        post(
            3,
            Platform::Facebook,
            ("Community Emergency Group", "CommunityEmergency"),
            "UPDATE: Community Center is now open as an emergency shelter. We have capacity for about 200 people. Basic supplies and medical aid available. Please share with those in need.",
            datetime!(2025-05-01 14:05 UTC),
            0.94,
            "Community Center",
            (false, true, true),
        ),
        post(
            4,
            Platform::Twitter,
            ("Mark Wilson", "@mark_wils"),
            "Water coming out of tap looks brown. Anyone else experiencing this? Could the water treatment plant be affected? #earthquake #cityneedstoknow",
            datetime!(2025-05-01 15:22 UTC),
            0.78,
            "Water Treatment Plant",
            (false, false, false),
        ),
        post(
            5,
            Platform::Facebook,
            ("Central Hospital", "CentralHospitalOfficial"),
            "Central Hospital east wing has sustained damage. ER remains OPEN. Please only come if you have a genuine emergency. Non-critical patients are being diverted to South Medical Center.",
            datetime!(2025-05-01 13:10 UTC),
            0.96,
            "Central Hospital",
            (true, true, true),
        ),
    ]
}

/// Recent reports listed when the jobs API is unreachable.
#[must_use]
pub fn recent_reports() -> Vec<RecentReport> {
    [
        ("sample-1", "Initial Disaster Assessment", "2025-05-01 14:30"),
        ("sample-2", "24-Hour Update Report", "2025-05-02 12:00"),
        ("sample-3", "Infrastructure Damage Report", "2025-05-02 16:45"),
    ]
    .into_iter()
    .map(|(id, title, date)| RecentReport { id: id.into(), title: title.into(), date: date.into(), kind: ReportKind::File })
    .collect()
}
