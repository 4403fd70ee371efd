//! The FULL_ANALYSIS pipeline.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{cluster_topics, extract_entities, generate_embeddings};
use super::{ClusterSummary, EmbedSummary, ExtractSummary};
use crate::domains::scoring::{compute_score, ScoreSummary};
use crate::kernel::jobs::JobError;
use crate::kernel::WorkerDeps;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullAnalysisSummary {
    pub extract: ExtractSummary,
    pub embed: EmbedSummary,
    pub cluster: ClusterSummary,
    pub score: ScoreSummary,
}

/// Extract, embed, cluster, score.
///
/// Extraction and embedding failures abort the run; rows they already wrote
/// stay. A clustering failure is recorded in the summary and scoring still
/// runs.
pub async fn full_analysis(project_id: Uuid, deps: &WorkerDeps) -> Result<FullAnalysisSummary, JobError> {
    let extract = extract_entities(project_id, deps).await?;
    let embed = generate_embeddings(project_id, deps).await?;

    let cluster = match cluster_topics(project_id, deps).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(project_id = %project_id, error = %e, "clustering failed, continuing");
            ClusterSummary::failed(&e)
        }
    };

    let score = compute_score(project_id, deps).await?;

    info!(project_id = %project_id, overall = score.overall, "full analysis finished");
    Ok(FullAnalysisSummary {
        extract,
        embed,
        cluster,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{
        content_item, unreachable, EngineCall, MockEngine, TestDependencies,
    };

    fn seed(test: &TestDependencies, project_id: Uuid, count: usize) {
        for n in 0..count {
            let mut item = content_item(project_id, &format!("https://acme.test/{n}"));
            item.raw_content = Some(format!("post {n}"));
            item.word_count = Some(400);
            test.store.insert_content_item(item);
        }
    }

    #[tokio::test]
    async fn test_runs_all_stages_in_order() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        seed(&test, project.id, 6);

        let summary = full_analysis(project.id, &test.into_deps()).await.unwrap();

        assert_eq!(summary.extract.items_sent, 6);
        assert_eq!(summary.embed.embedded, 6);
        assert!(!summary.cluster.skipped);
        assert_eq!(summary.cluster.topics, 1);

        let calls = test.engine.calls();
        assert!(matches!(calls[0], EngineCall::Extract { items: 6 }));
        assert!(matches!(calls[1], EngineCall::Embed { items: 6 }));
        assert!(matches!(calls[2], EngineCall::Cluster { items: 6 }));
    }

    #[tokio::test]
    async fn test_cluster_skipped_below_six_items() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        seed(&test, project.id, 5);

        let summary = full_analysis(project.id, &test.into_deps()).await.unwrap();

        assert!(summary.cluster.skipped);
        assert_eq!(test.engine.cluster_calls(), 0);
        assert!(test.into_deps().store.get_project_score(project.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cluster_failure_is_soft() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        seed(&test, project.id, 6);
        let test = test.with_engine(MockEngine::new().with_cluster(Err(unreachable("boom"))));

        let summary = full_analysis(project.id, &test.into_deps()).await.unwrap();

        assert!(summary.cluster.skipped);
        assert!(summary.cluster.error.as_deref().unwrap().starts_with("EngineUnavailable"));
        assert!(summary.score.content_count > 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts_before_scoring() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        seed(&test, project.id, 6);
        let test = test.with_engine(MockEngine::new().with_extract(Err(unreachable("boom"))));

        let err = full_analysis(project.id, &test.into_deps()).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(test.engine.calls().len(), 1);
        assert!(test.into_deps().store.get_project_score(project.id).await.unwrap().is_none());
    }
}
