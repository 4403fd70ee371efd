//! Briefs domain - turns detected content gaps into writing briefs.

pub mod actions;
pub mod gaps;
pub mod jobs;
pub mod models;

pub use actions::{generate_briefs, BriefSummary};
pub use gaps::{detect_gaps, Gap};
pub use models::*;
