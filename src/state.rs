//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Each concern the dashboard used to keep in page state (map records,
//! search guard, social monitor, watched jobs, notices) gets its own lock
//! so a slow writer on one page never blocks another. Locks are never held
//! across collaborator calls.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::clients::Collaborators;
use crate::config::ServiceConfig;
use crate::services::jobs::JobRegistry;
use crate::services::locations::LocationBook;
use crate::services::notices::{NoticeBoard, Severity};
use crate::services::search::SearchGuard;
use crate::services::social::SocialMonitor;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub clients: Collaborators,
    pub locations: Arc<RwLock<LocationBook>>,
    pub search: Arc<Mutex<SearchGuard>>,
    pub social: Arc<RwLock<SocialMonitor>>,
    pub jobs: Arc<RwLock<JobRegistry>>,
    pub notices: Arc<Mutex<NoticeBoard>>,
}

impl AppState {
    /// State seeded with the sample facilities and posts.
    #[must_use]
    pub fn new(config: ServiceConfig, clients: Collaborators) -> Self {
        Self {
            config: Arc::new(config),
            clients,
            locations: Arc::new(RwLock::new(LocationBook::with_samples())),
            search: Arc::new(Mutex::new(SearchGuard::new())),
            social: Arc::new(RwLock::new(SocialMonitor::with_samples())),
            jobs: Arc::new(RwLock::new(JobRegistry::new())),
            notices: Arc::new(Mutex::new(NoticeBoard::default())),
        }
    }

    /// Post a notice to the board and return its id.
    pub async fn notify(&self, severity: Severity, message: impl Into<String>) -> u64 {
        self.notices.lock().await.push(severity, message)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
