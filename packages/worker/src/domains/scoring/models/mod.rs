pub mod project_score;

pub use project_score::ProjectScore;
