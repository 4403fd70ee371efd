//! Scheduled maintenance triggers using tokio-cron-scheduler.
//!
//! The cron jobs never do the work themselves. They enqueue maintenance
//! payloads so the work runs on the `maintenance` channel like any other job.
//!
//! ```text
//! Scheduler (every hour)
//!     └─► enqueue ADVANCE_SCHEDULES
//! Scheduler (daily, 03:30)
//!     └─► enqueue PURGE_AUDIT_LOGS
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::kernel::jobs::{BaseJobQueue, EnqueueOptions, JobPayload};

pub const ADVANCE_SCHEDULES_CRON: &str = "0 0 * * * *";
pub const PURGE_AUDIT_LOGS_CRON: &str = "0 30 3 * * *";

/// Start all scheduled tasks
pub async fn start_scheduler(queue: Arc<dyn BaseJobQueue>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    scheduler
        .add(trigger(ADVANCE_SCHEDULES_CRON, JobPayload::AdvanceSchedules, queue.clone())?)
        .await?;
    scheduler
        .add(trigger(PURGE_AUDIT_LOGS_CRON, JobPayload::PurgeAuditLogs, queue)?)
        .await?;
    scheduler.start().await?;

    tracing::info!(
        advance = ADVANCE_SCHEDULES_CRON,
        purge = PURGE_AUDIT_LOGS_CRON,
        "scheduled tasks started"
    );
    Ok(scheduler)
}

fn trigger(schedule: &str, payload: JobPayload, queue: Arc<dyn BaseJobQueue>) -> Result<Job> {
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let queue = queue.clone();
        let payload = payload.clone();
        Box::pin(async move {
            match queue.enqueue(&payload, EnqueueOptions::default()).await {
                Ok(message_id) => tracing::info!(
                    message_id = %message_id,
                    job_type = %payload.job_type(),
                    "maintenance job enqueued"
                ),
                Err(e) => tracing::error!(
                    job_type = %payload.job_type(),
                    error = %e,
                    "failed to enqueue maintenance job"
                ),
            }
        })
    })?;
    Ok(job)
}
