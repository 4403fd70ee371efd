//! Job infrastructure for the content-intelligence worker.
//!
//! - [`JobRecord`] - durable discovery/analysis job rows
//! - [`BaseJobQueue`] - channel queue (Postgres or in-memory)
//! - [`JobRegistry`] - job type to handler mapping
//! - [`JobWorker`] - per-channel polling service
//!
//! Job handlers live in their domains; this module only provides the
//! plumbing.

mod error;
mod job;
mod payload;
mod queue;
mod registry;
mod summary;
mod worker;

pub use error::JobError;
pub use job::{JobFamily, JobRecord, JobStatus, NewJobRecord};
pub use payload::{
    AnalysisConfig, CrawlSiteConfig, JobChannel, JobEnvelope, JobPayload, JobType,
    MaintenanceTrigger, RecordRef, SearchPlatformConfig,
};
pub use queue::{
    BaseJobQueue, EnqueueOptions, InMemoryJobQueue, PostgresJobQueue, QueueMessage,
    DEFAULT_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS,
};
pub use registry::JobRegistry;
pub use summary::JobSummary;
pub use worker::{JobWorker, JobWorkerConfig};
