mod advance_schedules;

pub use advance_schedules::{advance_schedules, advance_schedules_at, AdvanceSummary};
