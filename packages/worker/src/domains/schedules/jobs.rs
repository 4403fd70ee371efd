//! Schedule job handler.

use crate::kernel::jobs::{JobRegistry, JobType, MaintenanceTrigger};

use super::actions::advance_schedules;

pub fn register(registry: &mut JobRegistry) {
    registry.register::<MaintenanceTrigger, _, _, _>(JobType::AdvanceSchedules, |_, deps| async move {
        advance_schedules(&deps).await
    });
}
