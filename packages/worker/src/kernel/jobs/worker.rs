//! Channel worker.
//!
//! A `JobWorker` owns one channel. It claims up to `concurrency` messages,
//! runs them side by side, and records each outcome on the job record:
//!
//! ```text
//! JobWorker
//!     │
//!     ├─► claim batch (BaseJobQueue)
//!     ├─► job record PENDING → RUNNING
//!     ├─► JobRegistry.execute(jobType, payload), renewing the lease
//!     ├─► COMPLETED + summary, audit, notification
//!     │     or FAILED + "Class: message", audit, retry record
//!     └─► ack / fail the queue message
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::JobError;
use super::job::{JobStatus, NewJobRecord};
use super::payload::{JobChannel, JobPayload, JobType, RecordRef};
use super::queue::QueueMessage;
use super::registry::JobRegistry;
use super::summary::JobSummary;
use crate::domains::projects::{CreateAuditLog, CreateNotification, NotificationType};
use crate::kernel::WorkerDeps;

/// Configuration for one channel worker.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    pub channel: JobChannel,
    /// Messages processed at once
    pub concurrency: usize,
    /// Sleep between empty polls
    pub poll_interval: Duration,
    /// Lease renewal period for running messages; keep it well under the
    /// queue's lease
    pub heartbeat_interval: Duration,
    pub worker_id: String,
}

impl JobWorkerConfig {
    pub fn for_channel(channel: JobChannel, concurrency: usize) -> Self {
        Self {
            channel,
            concurrency: concurrency.max(1),
            poll_interval: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(60),
            worker_id: format!("{}-worker-{}", channel, Uuid::new_v4()),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }
}

/// What to do with a claimed message before running it.
enum Admission {
    Run,
    Skip(&'static str),
}

pub struct JobWorker {
    registry: Arc<JobRegistry>,
    deps: Arc<WorkerDeps>,
    config: JobWorkerConfig,
}

impl JobWorker {
    pub fn new(registry: Arc<JobRegistry>, deps: Arc<WorkerDeps>, config: JobWorkerConfig) -> Self {
        Self {
            registry,
            deps,
            config,
        }
    }

    pub fn channel(&self) -> JobChannel {
        self.config.channel
    }

    /// Poll until `shutdown` fires. In-flight jobs finish before returning.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            channel = %self.config.channel,
            concurrency = self.config.concurrency,
            "job worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let processed = match self.run_once().await {
                Ok(processed) => processed,
                Err(e) => {
                    error!(channel = %self.config.channel, error = %e, "failed to claim jobs");
                    0
                }
            };

            if processed == 0 {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
            }
        }

        info!(worker_id = %self.config.worker_id, "job worker stopped");
        Ok(())
    }

    /// Claim one batch and process it. Returns the number of messages handled.
    pub async fn run_once(&self) -> Result<usize> {
        let messages = self
            .deps
            .queue
            .claim(self.config.channel, self.config.concurrency as i64)
            .await?;

        if messages.is_empty() {
            return Ok(0);
        }

        debug!(channel = %self.config.channel, count = messages.len(), "claimed jobs");

        let count = messages.len();
        let handles = messages
            .into_iter()
            .map(|message| self.process_message(message));
        futures::future::join_all(handles).await;

        Ok(count)
    }

    async fn process_message(&self, message: QueueMessage) {
        let payload: JobPayload = match serde_json::from_value(message.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                error!(message_id = %message.id, job_type = %message.job_type, error = %e, "failed to deserialize job");
                self.fail_message(message.id, &format!("InvalidJob: {}", e)).await;
                return;
            }
        };

        let job_type = payload.job_type();
        let record = payload.record();

        if let Some(record) = &record {
            if let Admission::Skip(reason) = self.admit(record).await {
                info!(job_id = %record.id, job_type = %job_type, reason, "skipping job");
                self.complete_message(message.id).await;
                return;
            }
        }

        info!(
            message_id = %message.id,
            job_id = ?record.map(|r| r.id),
            job_type = %job_type,
            attempt = message.attempts,
            "job started"
        );

        let result = self.execute_with_heartbeat(&message, job_type).await;

        match result {
            Ok(summary) => self.on_success(&message, &payload, summary).await,
            Err(err) => self.on_failure(&message, &payload, err).await,
        }
    }

    /// Run the handler while a side task keeps the message's lease alive, so
    /// no other worker claims it mid-run.
    async fn execute_with_heartbeat(&self, message: &QueueMessage, job_type: JobType) -> Result<JobSummary, JobError> {
        let queue = self.deps.queue.clone();
        let message_id = message.id;
        let heartbeat_interval = self.config.heartbeat_interval;
        let stop = CancellationToken::new();

        let heartbeat_stop = stop.clone();
        let heartbeat = tokio::spawn(async move {
            let mut interval = tokio::time::interval(heartbeat_interval);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = heartbeat_stop.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = queue.heartbeat(message_id).await {
                            warn!(message_id = %message_id, error = %e, "heartbeat failed");
                        }
                    }
                }
            }
        });

        let result = self
            .registry
            .execute(job_type, message.payload.clone(), self.deps.clone())
            .await;

        stop.cancel();
        if let Err(e) = heartbeat.await {
            warn!(message_id = %message_id, error = %e, "heartbeat task ended abnormally");
        }

        result
    }

    /// Move the record to RUNNING unless it was cancelled or already finished.
    async fn admit(&self, record: &RecordRef) -> Admission {
        let store = &self.deps.store;

        match store.get_job_record(record.family, record.id).await {
            Ok(existing) if existing.status == JobStatus::Cancelled => {
                return Admission::Skip("cancelled")
            }
            Ok(existing) if existing.status.is_terminal() => {
                return Admission::Skip("already finished")
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                warn!(job_id = %record.id, "job record not found, running anyway");
                return Admission::Run;
            }
            Err(e) => {
                warn!(job_id = %record.id, error = %e, "failed to load job record");
            }
        }

        if let Err(e) = store.mark_job_running(record.family, record.id).await {
            if e.is_not_found() {
                debug!(job_id = %record.id, "job record left RUNNING-eligible states");
            } else {
                warn!(job_id = %record.id, error = %e, "failed to mark job running");
            }
        }
        Admission::Run
    }

    async fn on_success(&self, message: &QueueMessage, payload: &JobPayload, summary: JobSummary) {
        let job_type = payload.job_type();
        let summary_value = summary.to_value();

        match payload.record() {
            Some(record) => {
                let store = &self.deps.store;
                match store
                    .complete_job_record(record.family, record.id, summary_value.clone())
                    .await
                {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {
                        debug!(job_id = %record.id, "no job record to complete")
                    }
                    Err(e) => error!(job_id = %record.id, error = %e, "failed to mark job completed"),
                }

                self.audit(
                    &record,
                    "job.completed",
                    json!({ "jobType": job_type.as_str(), "summary": summary_value }),
                )
                .await;

                if let Some(notification) = notification_for(&summary, &record) {
                    if let Err(e) = store.create_notification(notification).await {
                        warn!(job_id = %record.id, error = %e, "failed to create notification");
                    }
                }

                info!(job_id = %record.id, job_type = %job_type, "job completed");
            }
            None => info!(job_type = %job_type, summary = %summary_value, "maintenance job completed"),
        }

        self.complete_message(message.id).await;
    }

    async fn on_failure(&self, message: &QueueMessage, payload: &JobPayload, err: JobError) {
        let job_type = payload.job_type();
        let error_message = err.record_message();

        match payload.record() {
            Some(record) => {
                error!(
                    job_id = %record.id,
                    job_type = %job_type,
                    error_class = err.error_class(),
                    error = %err,
                    "job failed"
                );

                match self
                    .deps
                    .store
                    .fail_job_record(record.family, record.id, &error_message)
                    .await
                {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {
                        debug!(job_id = %record.id, "no job record to fail")
                    }
                    Err(e) => error!(job_id = %record.id, error = %e, "failed to mark job failed"),
                }

                self.audit(
                    &record,
                    "job.failed",
                    json!({
                        "jobType": job_type.as_str(),
                        "errorClass": err.error_class(),
                        "error": err.to_string(),
                        "attempt": message.attempts,
                    }),
                )
                .await;
            }
            None => error!(job_type = %job_type, error = %err, "maintenance job failed"),
        }

        if err.is_retryable() && message.has_attempts_left() {
            self.schedule_retry(message, payload).await;
        }

        self.fail_message(message.id, &error_message).await;
    }

    /// Retries never reuse a record: a fresh PENDING record points back at the
    /// failed one and a delayed message carries it.
    async fn schedule_retry(&self, message: &QueueMessage, payload: &JobPayload) {
        let retry_payload = match payload.record() {
            Some(record) => {
                let store = &self.deps.store;
                match store.get_job_record(record.family, record.id).await {
                    Ok(failed) => {
                        match store
                            .create_job_record(record.family, NewJobRecord::retry_of(&failed))
                            .await
                        {
                            Ok(retry) => payload.clone().with_job_record_id(retry.id),
                            Err(e) => {
                                error!(job_id = %record.id, error = %e, "failed to create retry record");
                                return;
                            }
                        }
                    }
                    Err(e) if e.is_not_found() => payload.clone(),
                    Err(e) => {
                        error!(job_id = %record.id, error = %e, "failed to load job record for retry");
                        return;
                    }
                }
            }
            None => payload.clone(),
        };

        let options = message.retry_options(Utc::now());
        let attempt = options.attempt;
        let run_at = options.run_at;
        match self.deps.queue.enqueue(&retry_payload, options).await {
            Ok(message_id) => info!(
                message_id = %message_id,
                job_id = ?retry_payload.record().map(|r| r.id),
                job_type = %retry_payload.job_type(),
                attempt,
                run_at = ?run_at,
                "job retry scheduled"
            ),
            Err(e) => error!(job_type = %retry_payload.job_type(), error = %e, "failed to enqueue retry"),
        }
    }

    async fn audit(&self, record: &RecordRef, action: &str, metadata: serde_json::Value) {
        let entry = CreateAuditLog::builder()
            .user_id(record.user_id)
            .project_id(record.project_id)
            .action(action)
            .entity_type(record.family.entity_type())
            .entity_id(record.id)
            .metadata(metadata)
            .build();

        if let Err(e) = self.deps.store.create_audit_log(entry).await {
            warn!(job_id = %record.id, action, error = %e, "failed to write audit log");
        }
    }

    async fn complete_message(&self, message_id: Uuid) {
        if let Err(e) = self.deps.queue.complete(message_id).await {
            error!(message_id = %message_id, error = %e, "failed to ack queue message");
        }
    }

    async fn fail_message(&self, message_id: Uuid, error: &str) {
        if let Err(e) = self.deps.queue.fail(message_id, error).await {
            error!(message_id = %message_id, error = %e, "failed to fail queue message");
        }
    }
}

/// The user-facing notification for a completed job, if its type has one.
fn notification_for(summary: &JobSummary, record: &RecordRef) -> Option<CreateNotification> {
    let (kind, title, message, page) = match summary {
        JobSummary::Crawl(s) => (
            NotificationType::DiscoveryCompleted,
            "Discovery completed",
            format!(
                "Crawled {} pages: {} new, {} updated",
                s.crawled, s.created, s.updated
            ),
            "content",
        ),
        JobSummary::Search(s) => (
            NotificationType::DiscoveryCompleted,
            "Discovery completed",
            format!(
                "Found {} results: {} new, {} updated",
                s.found, s.created, s.updated
            ),
            "content",
        ),
        JobSummary::FullAnalysis(s) => (
            NotificationType::AnalysisCompleted,
            "Analysis completed",
            format!("Content readiness score: {}/100", s.score.overall),
            "score",
        ),
        JobSummary::Briefs(s) => (
            NotificationType::BriefsGenerated,
            "Content briefs ready",
            format!(
                "{} new briefs generated from {} gaps",
                s.generated, s.gaps_found
            ),
            "briefs",
        ),
        _ => return None,
    };

    Some(
        CreateNotification::builder()
            .user_id(record.user_id)
            .notification_type(kind)
            .title(title)
            .message(message)
            .link(format!("/projects/{}/{}", record.project_id, page))
            .build(),
    )
}
