//! Scoring job handler.

use crate::kernel::jobs::{AnalysisConfig, JobEnvelope, JobRegistry, JobType};

use super::actions::compute_score;

pub fn register(registry: &mut JobRegistry) {
    registry.register::<JobEnvelope<AnalysisConfig>, _, _, _>(
        JobType::ComputeScore,
        |job, deps| async move { compute_score(job.project_id, &deps).await },
    );
}
