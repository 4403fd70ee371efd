//! Job registry mapping job types to handlers.
//!
//! Each domain registers its job types at startup. When the worker claims a
//! message, the registry deserializes the typed payload and runs the handler
//! in one step.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::JobError;
use super::payload::JobType;
use super::summary::JobSummary;
use crate::kernel::WorkerDeps;

type BoxedHandler = Box<
    dyn Fn(Value, Arc<WorkerDeps>) -> Pin<Box<dyn Future<Output = Result<JobSummary, JobError>> + Send>>
        + Send
        + Sync,
>;

/// Registry that maps job types to handlers.
///
/// # Example
///
/// ```ignore
/// let mut registry = JobRegistry::new();
///
/// registry.register::<JobEnvelope<CrawlSiteConfig>, _, _, _>(
///     JobType::CrawlSite,
///     |job, deps| async move { crawl_site(&job, &deps).await },
/// );
///
/// // Later, in the worker
/// let summary = registry.execute(JobType::CrawlSite, payload, deps.clone()).await?;
/// ```
#[derive(Default)]
pub struct JobRegistry {
    handlers: HashMap<JobType, BoxedHandler>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a job type with its handler.
    ///
    /// `J` is the payload shape the handler expects; it is deserialized from
    /// the raw message payload before the handler runs.
    pub fn register<J, S, F, Fut>(&mut self, job_type: JobType, handler: F)
    where
        J: DeserializeOwned + Send + 'static,
        S: Into<JobSummary> + 'static,
        F: Fn(J, Arc<WorkerDeps>) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<S, JobError>> + Send + 'static,
    {
        let boxed: BoxedHandler = Box::new(move |value, deps| {
            let handler = handler.clone();
            Box::pin(async move {
                let job: J = serde_json::from_value(value).map_err(|e| {
                    JobError::InvalidPayload(format!("failed to deserialize {}: {}", job_type, e))
                })?;
                handler(job, deps).await.map(Into::into)
            })
        });

        self.handlers.insert(job_type, boxed);
    }

    /// Run the handler registered for `job_type` against a raw payload.
    pub async fn execute(
        &self,
        job_type: JobType,
        payload: Value,
        deps: Arc<WorkerDeps>,
    ) -> Result<JobSummary, JobError> {
        let handler = self
            .handlers
            .get(&job_type)
            .ok_or_else(|| JobError::UnknownJobType(job_type.to_string()))?;
        handler(payload, deps).await
    }

    pub fn is_registered(&self, job_type: JobType) -> bool {
        self.handlers.contains_key(&job_type)
    }

    pub fn registered_types(&self) -> Vec<JobType> {
        self.handlers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::maintenance::PurgeSummary;
    use crate::kernel::jobs::MaintenanceTrigger;
    use crate::kernel::test_dependencies::TestDependencies;

    #[test]
    fn test_register_and_check() {
        let mut registry = JobRegistry::new();
        assert!(!registry.is_registered(JobType::PurgeAuditLogs));

        registry.register::<MaintenanceTrigger, _, _, _>(JobType::PurgeAuditLogs, |_, _| async {
            Ok(PurgeSummary::default())
        });

        assert!(registry.is_registered(JobType::PurgeAuditLogs));
        assert_eq!(registry.registered_types(), vec![JobType::PurgeAuditLogs]);
    }

    #[tokio::test]
    async fn test_unknown_job_type_is_an_invalid_job() {
        let registry = JobRegistry::new();
        let deps = TestDependencies::new().into_deps();

        let err = registry
            .execute(JobType::ComputeScore, Value::Null, deps)
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::UnknownJobType(_)));
        assert_eq!(err.error_class(), "InvalidJob");
    }

    #[tokio::test]
    async fn test_bad_payload_is_rejected_before_handler_runs() {
        use crate::kernel::jobs::{AnalysisConfig, JobEnvelope};

        let mut registry = JobRegistry::new();
        registry.register::<JobEnvelope<AnalysisConfig>, _, _, _>(
            JobType::ComputeScore,
            |_, _| async { Ok(PurgeSummary::default()) },
        );
        let deps = TestDependencies::new().into_deps();

        let err = registry
            .execute(JobType::ComputeScore, serde_json::json!({"projectId": 42}), deps)
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::InvalidPayload(_)));
    }
}
