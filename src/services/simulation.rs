//! Simulation service — background "real-time" status changes.
//!
//! Every interval, one or two random facilities get a new post-disaster
//! status. Changes are fire-and-forget: they are not reconciled against
//! concurrent edits and the last writer wins.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::services::locations::StatusChange;
use crate::state::AppState;

/// Spawn the simulation ticker. Returns `None` when the interval is zero.
pub fn spawn_simulation_task(state: AppState) -> Option<JoinHandle<()>> {
    let interval_ms = state.config.simulation_interval_ms;
    if interval_ms == 0 {
        info!("status simulation disabled");
        return None;
    }
    info!(interval_ms, "status simulation configured");

    Some(tokio::spawn(async move {
        let mut rng = StdRng::from_os_rng();
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            tick(&state, &mut rng).await;
        }
    }))
}

/// Apply one simulated tick and return the changes it made.
pub async fn tick(state: &AppState, rng: &mut StdRng) -> Vec<StatusChange> {
    let mut book = state.locations.write().await;
    let changes = book.simulate_tick(rng, OffsetDateTime::now_utc());
    for change in &changes {
        debug!(id = change.id, status = change.post_status.as_str(), "simulated status change");
    }
    info!(count = changes.len(), mode = ?book.mode(), "simulation tick applied");
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::model::DisplayMode;
    use crate::state::test_helpers::Mocks;

    #[tokio::test]
    async fn zero_interval_disables_simulation() {
        let config = ServiceConfig { simulation_interval_ms: 0, ..ServiceConfig::default() };
        let state = Mocks::default().app_state_with(config);
        assert!(spawn_simulation_task(state).is_none());
    }

    #[tokio::test]
    async fn tick_in_post_mode_updates_active_status() {
        let state = Mocks::default().app_state();
        state.locations.write().await.set_mode(DisplayMode::Post);
        let mut rng = StdRng::seed_from_u64(3);

        let changes = tick(&state, &mut rng).await;
        assert!((1..=2).contains(&changes.len()));
        let book = state.locations.read().await;
        for change in changes {
            assert_eq!(book.get(change.id).unwrap().status, change.post_status);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_mutates_after_interval() {
        let config = ServiceConfig { simulation_interval_ms: 1_000, ..ServiceConfig::default() };
        let state = Mocks::default().app_state_with(config);
        let before: Vec<_> = state.locations.read().await.records().iter().map(|r| r.last_updated).collect();

        let handle = spawn_simulation_task(state.clone()).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        handle.abort();

        let after: Vec<_> = state.locations.read().await.records().iter().map(|r| r.last_updated).collect();
        assert_ne!(before, after);
    }
}
