//! Scoring domain - the five-dimension readiness score.

pub mod actions;
pub mod dimensions;
pub mod jobs;
pub mod models;

pub use actions::{compute_score, generate_suggestions, ScoreSummary};
pub use dimensions::Dimensions;
pub use models::*;
