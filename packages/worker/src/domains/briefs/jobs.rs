//! Brief generation job handler.

use crate::kernel::jobs::{AnalysisConfig, JobEnvelope, JobRegistry, JobType};

use super::actions::generate_briefs;

pub fn register(registry: &mut JobRegistry) {
    registry.register::<JobEnvelope<AnalysisConfig>, _, _, _>(
        JobType::GenerateBriefs,
        |job, deps| async move { generate_briefs(job.project_id, &deps).await },
    );
}
