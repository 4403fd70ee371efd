pub mod content_brief;

pub use content_brief::{BriefStatus, ContentBrief, GapType, Severity, UpsertContentBrief};
