//! Schedules domain - recurring discovery.

pub mod actions;
pub mod jobs;
pub mod models;

pub use actions::{advance_schedules, advance_schedules_at, AdvanceSummary};
pub use models::*;
