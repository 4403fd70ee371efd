//! Maintenance domain - housekeeping run on the maintenance channel.

pub mod actions;
pub mod jobs;

pub use actions::{purge_audit_logs, PurgeSummary};
