//! Dashboard services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the reconciliation, parsing, and polling logic so
//! route handlers stay focused on protocol translation. Services take
//! `&AppState` and reach collaborators through its trait objects.

pub mod baseline;
pub mod feed;
pub mod health;
pub mod jobs;
pub mod locations;
pub mod notices;
pub mod reports;
pub mod search;
pub mod simulation;
pub mod social;
