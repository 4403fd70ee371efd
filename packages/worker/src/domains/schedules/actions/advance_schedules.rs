//! Enqueue discovery for every due schedule and move it to its next future slot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::domains::schedules::DiscoverySchedule;
use crate::kernel::jobs::{EnqueueOptions, JobError, JobFamily, JobPayload, JobType, NewJobRecord};
use crate::kernel::WorkerDeps;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceSummary {
    pub due: usize,
    pub enqueued: usize,
    pub failed: usize,
}

pub async fn advance_schedules(deps: &WorkerDeps) -> Result<AdvanceSummary, JobError> {
    advance_schedules_at(deps, Utc::now()).await
}

/// Runs the advancer as of `now`. A schedule that missed several periods is
/// enqueued once and skips ahead past `now`.
pub async fn advance_schedules_at(deps: &WorkerDeps, now: DateTime<Utc>) -> Result<AdvanceSummary, JobError> {
    let due = deps.store.list_due_schedules(now).await?;

    let mut summary = AdvanceSummary {
        due: due.len(),
        ..Default::default()
    };

    // One bad schedule never blocks the rest
    for schedule in &due {
        match enqueue_schedule(schedule, deps).await {
            Ok(()) => summary.enqueued += 1,
            Err(e) => {
                error!(schedule_id = %schedule.id, project_id = %schedule.project_id, error = %e, "failed to enqueue scheduled discovery");
                summary.failed += 1;
                continue;
            }
        }

        let Some(next_run_at) = schedule.frequency.next_after(schedule.next_run_at, now) else {
            warn!(schedule_id = %schedule.id, "next run is out of range, leaving schedule as is");
            continue;
        };
        if let Err(e) = deps.store.advance_schedule(schedule.id, next_run_at, now).await {
            warn!(schedule_id = %schedule.id, error = %e, "failed to advance schedule");
        }
    }

    info!(
        due = summary.due,
        enqueued = summary.enqueued,
        failed = summary.failed,
        "schedules advanced"
    );
    Ok(summary)
}

async fn enqueue_schedule(schedule: &DiscoverySchedule, deps: &WorkerDeps) -> Result<(), JobError> {
    let job_type = JobType::parse(&schedule.job_type)
        .filter(|t| t.family() == Some(JobFamily::Discovery))
        .ok_or_else(|| JobError::UnknownJobType(schedule.job_type.clone()))?;
    let project = deps.store.get_project(schedule.project_id).await?;

    let record = deps
        .store
        .create_job_record(
            JobFamily::Discovery,
            NewJobRecord::builder()
                .project_id(schedule.project_id)
                .job_type(job_type.as_str())
                .config(schedule.config.clone())
                .build(),
        )
        .await?;

    let enqueued = match JobPayload::from_parts(
        job_type,
        project.id,
        project.user_id,
        record.id,
        schedule.config.clone(),
    ) {
        Ok(payload) => deps
            .queue
            .enqueue(&payload, EnqueueOptions::default())
            .await
            .map(|_| ())
            .map_err(JobError::Internal),
        Err(e) => Err(JobError::InvalidPayload(e.to_string())),
    };

    if let Err(e) = &enqueued {
        // The record would otherwise sit in PENDING forever
        if let Err(mark) = deps
            .store
            .fail_job_record(JobFamily::Discovery, record.id, &e.record_message())
            .await
        {
            warn!(job_id = %record.id, error = %mark, "failed to mark unscheduled job failed");
        }
        return enqueued;
    }

    info!(
        schedule_id = %schedule.id,
        job_id = %record.id,
        job_type = %job_type,
        "scheduled discovery enqueued"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::domains::schedules::ScheduleFrequency;
    use crate::kernel::jobs::{InMemoryJobQueue, JobChannel, JobStatus};
    use crate::kernel::test_dependencies::TestDependencies;

    fn schedule(project_id: Uuid, frequency: ScheduleFrequency, next_run_at: chrono::DateTime<Utc>) -> DiscoverySchedule {
        DiscoverySchedule {
            id: Uuid::new_v4(),
            project_id,
            job_type: "CRAWL_SITE".into(),
            frequency,
            config: json!({"url": "https://acme.test", "maxPages": 25}),
            enabled: true,
            next_run_at,
            last_run_at: None,
            created_at: next_run_at - Duration::days(30),
        }
    }

    #[tokio::test]
    async fn test_due_weekly_schedule_enqueues_and_moves_one_week() {
        let test_deps = TestDependencies::new();
        let project = test_deps.seed_project();
        let due_at = Utc::now() - Duration::hours(3);
        let weekly = schedule(project.id, ScheduleFrequency::Weekly, due_at);
        test_deps.store.insert_schedule(weekly.clone());

        let summary = advance_schedules(&test_deps.into_deps()).await.unwrap();

        assert_eq!(
            summary,
            AdvanceSummary {
                due: 1,
                enqueued: 1,
                failed: 0
            }
        );

        let advanced = test_deps.store.schedule(weekly.id).unwrap();
        assert_eq!(advanced.next_run_at, due_at + Duration::days(7));
        assert!(advanced.last_run_at.is_some());

        let records = test_deps.store.job_records(JobFamily::Discovery);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].job_type, "CRAWL_SITE");
        assert_eq!(records[0].status, JobStatus::Pending);

        let pending = test_deps.queue.pending(JobChannel::Discovery);
        assert_eq!(pending.len(), 1);
        let payload: JobPayload = serde_json::from_value(pending[0].payload.clone()).unwrap();
        let record = payload.record().unwrap();
        assert_eq!(record.id, records[0].id);
        assert_eq!(record.user_id, project.user_id);
    }

    #[tokio::test]
    async fn test_monthly_schedule_uses_calendar_months() {
        let test_deps = TestDependencies::new();
        let project = test_deps.seed_project();
        let due_at = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let monthly = schedule(project.id, ScheduleFrequency::Monthly, due_at);
        test_deps.store.insert_schedule(monthly.clone());

        let now = Utc.with_ymd_and_hms(2024, 2, 10, 1, 0, 0).unwrap();
        advance_schedules_at(&test_deps.into_deps(), now).await.unwrap();

        let advanced = test_deps.store.schedule(monthly.id).unwrap();
        assert_eq!(advanced.next_run_at, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_enqueue_failure_leaves_schedule_due_and_continues() {
        let test_deps = TestDependencies::new().with_queue(InMemoryJobQueue::new().with_enqueue_failures(1));
        let project = test_deps.seed_project();
        let now = Utc::now();
        let first = schedule(project.id, ScheduleFrequency::Weekly, now - Duration::hours(2));
        let second = schedule(project.id, ScheduleFrequency::Quarterly, now - Duration::hours(1));
        test_deps.store.insert_schedule(first.clone());
        test_deps.store.insert_schedule(second.clone());

        let summary = advance_schedules(&test_deps.into_deps()).await.unwrap();

        assert_eq!(summary.due, 2);
        assert_eq!(summary.enqueued, 1);
        assert_eq!(summary.failed, 1);

        // The oldest schedule hit the failing enqueue and stays due
        let stuck = test_deps.store.schedule(first.id).unwrap();
        assert_eq!(stuck.next_run_at, first.next_run_at);
        assert!(stuck.last_run_at.is_none());

        let moved = test_deps.store.schedule(second.id).unwrap();
        assert!(moved.next_run_at > now);

        let failed: Vec<_> = test_deps
            .store
            .job_records(JobFamily::Discovery)
            .into_iter()
            .filter(|r| r.status == JobStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(test_deps.queue.pending(JobChannel::Discovery).len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_and_future_schedules_are_ignored() {
        let test_deps = TestDependencies::new();
        let project = test_deps.seed_project();
        let now = Utc::now();

        let mut disabled = schedule(project.id, ScheduleFrequency::Weekly, now - Duration::days(1));
        disabled.enabled = false;
        let future = schedule(project.id, ScheduleFrequency::Weekly, now + Duration::days(1));
        test_deps.store.insert_schedule(disabled.clone());
        test_deps.store.insert_schedule(future.clone());

        let summary = advance_schedules(&test_deps.into_deps()).await.unwrap();

        assert_eq!(summary, AdvanceSummary::default());
        assert!(test_deps.queue.messages().is_empty());
        assert_eq!(test_deps.store.schedule(disabled.id).unwrap().next_run_at, disabled.next_run_at);
    }

    #[tokio::test]
    async fn test_analysis_job_type_on_schedule_is_rejected() {
        let test_deps = TestDependencies::new();
        let project = test_deps.seed_project();
        let mut odd = schedule(project.id, ScheduleFrequency::Weekly, Utc::now() - Duration::hours(1));
        odd.job_type = "FULL_ANALYSIS".into();
        test_deps.store.insert_schedule(odd);

        let summary = advance_schedules(&test_deps.into_deps()).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert!(test_deps.store.job_records(JobFamily::Discovery).is_empty());
    }

    #[tokio::test]
    async fn test_schedule_far_behind_is_enqueued_once_and_skips_ahead() {
        let test_deps = TestDependencies::new();
        let project = test_deps.seed_project();
        let now = Utc::now();
        let due_at = now - Duration::weeks(10) - Duration::hours(1);
        let stale = schedule(project.id, ScheduleFrequency::Weekly, due_at);
        test_deps.store.insert_schedule(stale.clone());
        let deps = test_deps.into_deps();

        // Three hourly ticks
        let first = advance_schedules_at(&deps, now).await.unwrap();
        let second = advance_schedules_at(&deps, now + Duration::hours(1)).await.unwrap();
        let third = advance_schedules_at(&deps, now + Duration::hours(2)).await.unwrap();

        assert_eq!(first.enqueued, 1);
        assert_eq!(second, AdvanceSummary::default());
        assert_eq!(third, AdvanceSummary::default());
        assert_eq!(test_deps.queue.pending(JobChannel::Discovery).len(), 1);

        let advanced = test_deps.store.schedule(stale.id).unwrap();
        assert_eq!(advanced.next_run_at, due_at + Duration::weeks(11));
        assert!(advanced.next_run_at > now);
    }
}
