mod compute_score;
mod suggestions;

pub use compute_score::{compute_score, ScoreSummary};
pub use suggestions::{generate_suggestions, MAX_SUGGESTIONS};
