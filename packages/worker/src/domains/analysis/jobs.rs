//! Analysis job handlers: each stage alone, plus the full pipeline.

use crate::kernel::jobs::{AnalysisConfig, JobEnvelope, JobRegistry, JobType};

use super::actions::{cluster_topics, extract_entities, full_analysis, generate_embeddings};

type AnalysisJob = JobEnvelope<AnalysisConfig>;

pub fn register(registry: &mut JobRegistry) {
    registry.register::<AnalysisJob, _, _, _>(JobType::ExtractEntities, |job, deps| async move {
        extract_entities(job.project_id, &deps).await
    });

    registry.register::<AnalysisJob, _, _, _>(JobType::GenerateEmbeddings, |job, deps| async move {
        generate_embeddings(job.project_id, &deps).await
    });

    registry.register::<AnalysisJob, _, _, _>(JobType::ClusterTopics, |job, deps| async move {
        cluster_topics(job.project_id, &deps).await
    });

    registry.register::<AnalysisJob, _, _, _>(JobType::FullAnalysis, |job, deps| async move {
        full_analysis(job.project_id, &deps).await
    });
}
