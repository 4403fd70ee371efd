//! In-process harness: in-memory store and queue, a scripted engine, and the
//! real registry and channel workers on top.

use std::sync::Arc;

use uuid::Uuid;
use worker_core::domains::projects::Project;
use worker_core::domains::register_all;
use worker_core::kernel::jobs::{
    AnalysisConfig, BaseJobQueue, EnqueueOptions, JobChannel, JobEnvelope, JobFamily, JobPayload,
    JobRegistry, JobWorker, JobWorkerConfig,
};
use worker_core::kernel::test_dependencies::MockEngine;
use worker_core::kernel::{TestDependencies, WorkerDeps};

pub struct TestHarness {
    pub test: TestDependencies,
    pub deps: Arc<WorkerDeps>,
    registry: Arc<JobRegistry>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_engine(MockEngine::new())
    }

    pub fn with_engine(engine: MockEngine) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let test = TestDependencies::new().with_engine(engine);
        let deps = test.into_deps();

        let mut registry = JobRegistry::new();
        register_all(&mut registry);

        Self {
            test,
            deps,
            registry: Arc::new(registry),
        }
    }

    pub fn worker(&self, channel: JobChannel) -> JobWorker {
        JobWorker::new(
            self.registry.clone(),
            self.deps.clone(),
            JobWorkerConfig::for_channel(channel, 4),
        )
    }

    pub async fn enqueue(&self, payload: &JobPayload) -> Uuid {
        self.deps
            .queue
            .enqueue(payload, EnqueueOptions::default())
            .await
            .expect("enqueue")
    }

    /// Seed a PENDING analysis record and enqueue its payload.
    pub async fn enqueue_analysis(
        &self,
        project: &Project,
        job_type: &str,
        wrap: fn(JobEnvelope<AnalysisConfig>) -> JobPayload,
    ) -> Uuid {
        let record = self.test.seed_record(JobFamily::Analysis, project.id, job_type);
        let payload = wrap(JobEnvelope::new(
            project.id,
            project.user_id,
            record.id,
            AnalysisConfig::default(),
        ));
        self.enqueue(&payload).await;
        record.id
    }

    /// Run the channel until nothing claimable is left. Retry backoff is
    /// skipped so retries run in the same drain.
    pub async fn drain(&self, channel: JobChannel) -> usize {
        let worker = self.worker(channel);
        let mut total = 0;
        loop {
            self.test.queue.release_delayed();
            let processed = worker.run_once().await.expect("run_once");
            if processed == 0 {
                return total;
            }
            total += processed;
        }
    }
}
