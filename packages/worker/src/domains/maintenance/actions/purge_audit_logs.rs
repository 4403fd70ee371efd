use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::kernel::jobs::JobError;
use crate::kernel::WorkerDeps;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeSummary {
    pub deleted: u64,
    /// Finished queue messages removed alongside the audit entries
    pub queue_messages_deleted: u64,
    pub cutoff: Option<DateTime<Utc>>,
}

/// Delete audit entries, and done or failed queue messages, older than the
/// configured retention window.
pub async fn purge_audit_logs(deps: &WorkerDeps) -> Result<PurgeSummary, JobError> {
    let cutoff = Utc::now() - Duration::days(deps.audit_retention_days);
    let deleted = deps.store.purge_audit_logs(cutoff).await?;

    // Queue cleanup is housekeeping; the audit purge already committed
    let queue_messages_deleted = match deps.queue.purge_finished(cutoff).await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "failed to purge finished queue messages");
            0
        }
    };

    info!(deleted, queue_messages_deleted, cutoff = %cutoff, "audit logs purged");
    Ok(PurgeSummary {
        deleted,
        queue_messages_deleted,
        cutoff: Some(cutoff),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::domains::projects::AuditLog;
    use crate::kernel::jobs::{BaseJobQueue, EnqueueOptions, JobPayload};
    use crate::kernel::test_dependencies::TestDependencies;

    fn entry(age_days: i64) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4(),
            user_id: None,
            project_id: None,
            action: "job.completed".into(),
            entity_type: "crawl_job".into(),
            entity_id: Some(Uuid::new_v4()),
            metadata: json!({}),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[tokio::test]
    async fn test_only_entries_past_retention_are_deleted() {
        let test_deps = TestDependencies::new();
        test_deps.store.insert_audit_log(entry(120));
        test_deps.store.insert_audit_log(entry(91));
        test_deps.store.insert_audit_log(entry(10));

        let summary = purge_audit_logs(&test_deps.into_deps()).await.unwrap();

        assert_eq!(summary.deleted, 2);
        assert!(summary.cutoff.is_some());
        assert_eq!(test_deps.store.audit_logs().len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_to_purge() {
        let test_deps = TestDependencies::new();

        let summary = purge_audit_logs(&test_deps.into_deps()).await.unwrap();

        assert_eq!(summary.deleted, 0);
    }

    #[tokio::test]
    async fn test_old_finished_queue_messages_are_purged() {
        let test_deps = TestDependencies::new();
        let deps = test_deps.into_deps();
        let old_done = deps
            .queue
            .enqueue(&JobPayload::AdvanceSchedules, EnqueueOptions::default())
            .await
            .unwrap();
        let recent_done = deps
            .queue
            .enqueue(&JobPayload::AdvanceSchedules, EnqueueOptions::default())
            .await
            .unwrap();
        let pending = deps
            .queue
            .enqueue(&JobPayload::AdvanceSchedules, EnqueueOptions::default())
            .await
            .unwrap();
        deps.queue.complete(old_done).await.unwrap();
        deps.queue.complete(recent_done).await.unwrap();
        test_deps.queue.backdate(old_done, Utc::now() - Duration::days(120));
        test_deps.queue.backdate(pending, Utc::now() - Duration::days(120));

        let summary = purge_audit_logs(&deps).await.unwrap();

        assert_eq!(summary.queue_messages_deleted, 1);
        let left: Vec<_> = test_deps.queue.messages().into_iter().map(|m| m.id).collect();
        assert_eq!(left, vec![recent_done, pending]);
    }
}
