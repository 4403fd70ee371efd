mod generate_briefs;

pub use generate_briefs::{generate_briefs, BriefSummary, BRIEF_CONCURRENCY};
