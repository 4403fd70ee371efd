//! Maintenance job handlers.

use crate::kernel::jobs::{JobRegistry, JobType, MaintenanceTrigger};

use super::actions::purge_audit_logs;

pub fn register(registry: &mut JobRegistry) {
    registry.register::<MaintenanceTrigger, _, _, _>(JobType::PurgeAuditLogs, |_, deps| async move {
        purge_audit_logs(&deps).await
    });
}
