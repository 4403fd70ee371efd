pub mod discovery_schedule;

pub use discovery_schedule::{DiscoverySchedule, ScheduleFrequency};
