// Domain modules. Each domain keeps its models, actions and job handlers
// together; `register_all` wires every handler into the worker registry.

pub mod analysis;
pub mod briefs;
pub mod content;
pub mod discovery;
pub mod maintenance;
pub mod projects;
pub mod schedules;
pub mod scoring;

use crate::kernel::jobs::JobRegistry;

/// Register every job handler the worker knows how to run.
pub fn register_all(registry: &mut JobRegistry) {
    discovery::jobs::register(registry);
    analysis::jobs::register(registry);
    scoring::jobs::register(registry);
    briefs::jobs::register(registry);
    schedules::jobs::register(registry);
    maintenance::jobs::register(registry);
}
