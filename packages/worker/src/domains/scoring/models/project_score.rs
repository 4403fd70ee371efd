//! ProjectScore model - one readiness score row per project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::kernel::store::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectScore {
    pub project_id: Uuid,
    pub coverage: f64,
    pub depth: f64,
    pub freshness: f64,
    pub authority: f64,
    pub coherence: f64,
    pub overall: i32,
    #[sqlx(json)]
    pub suggestions: Vec<String>,
    pub content_count: i32,
    pub is_stale: bool,
    pub computed_at: DateTime<Utc>,
}

impl ProjectScore {
    /// Insert or replace the project's score. Always clears `is_stale`.
    pub async fn upsert(score: &ProjectScore, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO project_scores (
                project_id, coverage, depth, freshness, authority, coherence,
                overall, suggestions, content_count, is_stale, computed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, $10)
            ON CONFLICT (project_id) DO UPDATE SET
                coverage = EXCLUDED.coverage,
                depth = EXCLUDED.depth,
                freshness = EXCLUDED.freshness,
                authority = EXCLUDED.authority,
                coherence = EXCLUDED.coherence,
                overall = EXCLUDED.overall,
                suggestions = EXCLUDED.suggestions,
                content_count = EXCLUDED.content_count,
                is_stale = FALSE,
                computed_at = EXCLUDED.computed_at
            RETURNING *
            "#,
        )
        .bind(score.project_id)
        .bind(score.coverage)
        .bind(score.depth)
        .bind(score.freshness)
        .bind(score.authority)
        .bind(score.coherence)
        .bind(score.overall)
        .bind(Json(&score.suggestions))
        .bind(score.content_count)
        .bind(score.computed_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_project(project_id: Uuid, pool: &PgPool) -> Result<Option<Self>, StoreError> {
        sqlx::query_as::<_, Self>("SELECT * FROM project_scores WHERE project_id = $1")
            .bind(project_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Flag the score for recomputation. No-op when no score exists yet.
    pub async fn mark_stale(project_id: Uuid, pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query("UPDATE project_scores SET is_stale = TRUE WHERE project_id = $1")
            .bind(project_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
