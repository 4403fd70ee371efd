//! Channel-based dispatch queue.
//!
//! The queue only holds transient dispatch state. Job records in the store
//! stay authoritative, and a message may be delivered more than once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::payload::{JobChannel, JobPayload};

/// Attempts per job, counting the first run.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 2;

/// First retry delay; doubles per attempt.
pub const DEFAULT_BACKOFF_MS: i64 = 10_000;

/// How long a claim holds a message before another worker may take it.
/// The running worker renews it with `heartbeat`.
pub const DEFAULT_LEASE_MS: i64 = 5 * 60 * 1000;

/// A message claimed from a channel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueMessage {
    pub id: Uuid,
    pub channel: String,
    pub job_type: String,
    pub payload: Value,
    /// 1-based attempt number of this delivery
    pub attempts: i32,
    pub max_attempts: i32,
    pub backoff_ms: i64,
    pub run_at: DateTime<Utc>,
    pub status: String,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueMessage {
    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Exponential backoff: `backoff_ms * 2^(attempts - 1)`.
    pub fn retry_delay(&self) -> Duration {
        let exponent = (self.attempts.max(1) - 1).min(16) as u32;
        Duration::milliseconds(self.backoff_ms.saturating_mul(2i64.pow(exponent)))
    }

    /// Options for the follow-up delivery of this message.
    pub fn retry_options(&self, now: DateTime<Utc>) -> EnqueueOptions {
        EnqueueOptions {
            run_at: Some(now + self.retry_delay()),
            attempt: self.attempts + 1,
            max_attempts: self.max_attempts,
            backoff_ms: self.backoff_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnqueueOptions {
    /// Earliest time the message may be claimed; `None` means now.
    pub run_at: Option<DateTime<Utc>>,
    pub attempt: i32,
    pub max_attempts: i32,
    pub backoff_ms: i64,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        Self {
            run_at: None,
            attempt: 1,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

impl EnqueueOptions {
    pub fn delayed(run_at: DateTime<Utc>) -> Self {
        Self {
            run_at: Some(run_at),
            ..Default::default()
        }
    }
}

/// Trait for queue operations.
///
/// The worker claims messages per channel, runs them, then either completes
/// or fails them. Retries are new messages, enqueued by the worker.
#[async_trait]
pub trait BaseJobQueue: Send + Sync {
    /// Enqueue a payload on its job type's channel. Returns the message id.
    async fn enqueue(&self, payload: &JobPayload, options: EnqueueOptions) -> Result<Uuid>;

    /// Claim up to `limit` ready messages from `channel`.
    async fn claim(&self, channel: JobChannel, limit: i64) -> Result<Vec<QueueMessage>>;

    async fn complete(&self, message_id: Uuid) -> Result<()>;

    async fn fail(&self, message_id: Uuid, error: &str) -> Result<()>;

    /// Extend the lease on a running message.
    async fn heartbeat(&self, message_id: Uuid) -> Result<()>;

    /// Delete done and failed messages last touched before `before`.
    async fn purge_finished(&self, before: DateTime<Utc>) -> Result<u64>;
}

// ============================================================================
// Postgres
// ============================================================================

/// PostgreSQL-backed queue using `FOR UPDATE SKIP LOCKED` claims.
///
/// A claimed message is leased and the worker renews the lease while the
/// job runs. If the worker dies mid-job, the message becomes claimable again
/// once `locked_until` passes.
pub struct PostgresJobQueue {
    pool: PgPool,
    lease_ms: i64,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lease_ms: DEFAULT_LEASE_MS,
        }
    }

    pub fn with_lease_duration(pool: PgPool, lease_ms: i64) -> Self {
        Self { pool, lease_ms }
    }
}

#[async_trait]
impl BaseJobQueue for PostgresJobQueue {
    async fn enqueue(&self, payload: &JobPayload, options: EnqueueOptions) -> Result<Uuid> {
        let job_type = payload.job_type();
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO queue_messages (
                id, channel, job_type, payload, attempts, max_attempts, backoff_ms, run_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW()))
            RETURNING id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(job_type.channel().as_str())
        .bind(job_type.as_str())
        .bind(serde_json::to_value(payload)?)
        .bind(options.attempt)
        .bind(options.max_attempts)
        .bind(options.backoff_ms)
        .bind(options.run_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn claim(&self, channel: JobChannel, limit: i64) -> Result<Vec<QueueMessage>> {
        let messages = sqlx::query_as::<_, QueueMessage>(
            r#"
            UPDATE queue_messages
            SET status = 'running',
                locked_until = NOW() + ($3::float8 * INTERVAL '1 millisecond'),
                updated_at = NOW()
            WHERE id IN (
                SELECT id FROM queue_messages
                WHERE channel = $1
                  AND (
                    (status = 'pending' AND run_at <= NOW())
                    OR (status = 'running' AND locked_until < NOW())
                  )
                ORDER BY run_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, channel, job_type, payload, attempts, max_attempts, backoff_ms,
                      run_at, status, locked_until, last_error, created_at, updated_at
            "#,
        )
        .bind(channel.as_str())
        .bind(limit)
        .bind(self.lease_ms as f64)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn complete(&self, message_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE queue_messages
             SET status = 'done', locked_until = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(message_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail(&self, message_id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE queue_messages
             SET status = 'failed', last_error = $2, locked_until = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(message_id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn heartbeat(&self, message_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE queue_messages
             SET locked_until = NOW() + ($2::float8 * INTERVAL '1 millisecond'), updated_at = NOW()
             WHERE id = $1 AND status = 'running'",
        )
        .bind(message_id)
        .bind(self.lease_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM queue_messages
             WHERE status IN ('done', 'failed') AND updated_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local queue for tests and one-shot runs.
pub struct InMemoryJobQueue {
    messages: Mutex<Vec<QueueMessage>>,
    failing_enqueues: AtomicUsize,
    lease: Duration,
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            failing_enqueues: AtomicUsize::new(0),
            lease: Duration::milliseconds(DEFAULT_LEASE_MS),
        }
    }
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lease granted per claim and per heartbeat.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Reject the next `count` enqueues.
    pub fn with_enqueue_failures(self, count: usize) -> Self {
        self.failing_enqueues.store(count, Ordering::SeqCst);
        self
    }

    /// Snapshot of every message ever enqueued.
    pub fn messages(&self) -> Vec<QueueMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Messages on `channel` still waiting to run.
    pub fn pending(&self, channel: JobChannel) -> Vec<QueueMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.channel == channel.as_str() && m.status == "pending")
            .collect()
    }

    /// Make every pending message claimable now (skips backoff delays).
    pub fn release_delayed(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            let now = Utc::now();
            for message in messages.iter_mut().filter(|m| m.status == "pending") {
                message.run_at = message.run_at.min(now);
            }
        }
    }

    /// Pretend a message was last touched at `updated_at`.
    pub fn backdate(&self, message_id: Uuid, updated_at: DateTime<Utc>) {
        if let Ok(mut messages) = self.messages.lock() {
            if let Some(message) = messages.iter_mut().find(|m| m.id == message_id) {
                message.updated_at = updated_at;
            }
        }
    }

    fn set_status(&self, message_id: Uuid, status: &str, error: Option<&str>) -> Result<()> {
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| anyhow!("queue lock poisoned"))?;
        let message = messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| anyhow!("queue message {} not found", message_id))?;
        message.status = status.to_string();
        message.locked_until = None;
        message.updated_at = Utc::now();
        if let Some(error) = error {
            message.last_error = Some(error.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl BaseJobQueue for InMemoryJobQueue {
    async fn enqueue(&self, payload: &JobPayload, options: EnqueueOptions) -> Result<Uuid> {
        let rejected = self
            .failing_enqueues
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(anyhow!("queue unavailable"));
        }

        let job_type = payload.job_type();
        let now = Utc::now();
        let message = QueueMessage {
            id: Uuid::now_v7(),
            channel: job_type.channel().as_str().to_string(),
            job_type: job_type.as_str().to_string(),
            payload: serde_json::to_value(payload)?,
            attempts: options.attempt,
            max_attempts: options.max_attempts,
            backoff_ms: options.backoff_ms,
            run_at: options.run_at.unwrap_or(now),
            status: "pending".to_string(),
            locked_until: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        let id = message.id;
        self.messages
            .lock()
            .map_err(|_| anyhow!("queue lock poisoned"))?
            .push(message);
        Ok(id)
    }

    async fn claim(&self, channel: JobChannel, limit: i64) -> Result<Vec<QueueMessage>> {
        let now = Utc::now();
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| anyhow!("queue lock poisoned"))?;

        let mut claimed = Vec::new();
        for message in messages.iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            let ready = match message.status.as_str() {
                "pending" => message.run_at <= now,
                "running" => message.locked_until.is_some_and(|until| until < now),
                _ => false,
            };
            if message.channel == channel.as_str() && ready {
                message.status = "running".to_string();
                message.locked_until = Some(now + self.lease);
                message.updated_at = now;
                claimed.push(message.clone());
            }
        }
        Ok(claimed)
    }

    async fn complete(&self, message_id: Uuid) -> Result<()> {
        self.set_status(message_id, "done", None)
    }

    async fn fail(&self, message_id: Uuid, error: &str) -> Result<()> {
        self.set_status(message_id, "failed", Some(error))
    }

    async fn heartbeat(&self, message_id: Uuid) -> Result<()> {
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| anyhow!("queue lock poisoned"))?;
        if let Some(message) = messages
            .iter_mut()
            .find(|m| m.id == message_id && m.status == "running")
        {
            let now = Utc::now();
            message.locked_until = Some(now + self.lease);
            message.updated_at = now;
        }
        Ok(())
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> Result<u64> {
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| anyhow!("queue lock poisoned"))?;
        let len = messages.len();
        messages.retain(|m| !(matches!(m.status.as_str(), "done" | "failed") && m.updated_at < before));
        Ok((len - messages.len()) as u64)
    }
}
