//! Compute and store a project's readiness score.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::suggestions::generate_suggestions;
use crate::domains::scoring::dimensions;
use crate::domains::scoring::ProjectScore;
use crate::kernel::jobs::JobError;
use crate::kernel::WorkerDeps;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub overall: i32,
    pub coverage: f64,
    pub depth: f64,
    pub freshness: f64,
    pub authority: f64,
    pub coherence: f64,
    pub suggestions: usize,
    pub content_count: i32,
}

impl From<&ProjectScore> for ScoreSummary {
    fn from(score: &ProjectScore) -> Self {
        Self {
            overall: score.overall,
            coverage: score.coverage,
            depth: score.depth,
            freshness: score.freshness,
            authority: score.authority,
            coherence: score.coherence,
            suggestions: score.suggestions.len(),
            content_count: score.content_count,
        }
    }
}

/// Recompute every dimension from current data and upsert the score row.
pub async fn compute_score(project_id: Uuid, deps: &WorkerDeps) -> Result<ScoreSummary, JobError> {
    let project = deps.store.get_project(project_id).await?;
    let items = deps.store.list_content_items(project_id).await?;
    let entities = deps.store.list_entities(project_id).await?;
    let content_entities = deps.store.list_content_entities(project_id).await?;

    let now = Utc::now();
    let dims = dimensions::compute(&items, &entities, &content_entities, now);
    let suggestions = generate_suggestions(&project, &dims, deps).await;
    let content_count = items.iter().filter(|i| i.status.is_active()).count() as i32;

    let score = deps
        .store
        .upsert_project_score(ProjectScore {
            project_id,
            coverage: dims.coverage,
            depth: dims.depth,
            freshness: dims.freshness,
            authority: dims.authority,
            coherence: dims.coherence,
            overall: dims.overall(),
            suggestions,
            content_count,
            is_stale: false,
            computed_at: now,
        })
        .await?;

    info!(
        project_id = %project_id,
        overall = score.overall,
        content_count = score.content_count,
        "project score computed"
    );
    Ok(ScoreSummary::from(&score))
}
