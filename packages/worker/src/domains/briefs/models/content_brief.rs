//! ContentBrief model
//!
//! A generated writing brief that closes one detected gap. One row per
//! `(project_id, gap_type, gap_label)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::domains::content::Platform;
use crate::kernel::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gap_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapType {
    Platform,
    Topic,
    Entity,
    Freshness,
}

impl GapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapType::Platform => "PLATFORM",
            GapType::Topic => "TOPIC",
            GapType::Entity => "ENTITY",
            GapType::Freshness => "FRESHNESS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gap_severity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "brief_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BriefStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentBrief {
    pub id: Uuid,
    pub project_id: Uuid,
    pub gap_type: GapType,
    pub gap_label: String,
    pub platform: Option<Platform>,
    pub severity: Severity,
    pub title: String,
    #[sqlx(json)]
    pub key_points: Vec<String>,
    #[sqlx(json)]
    pub entities: Vec<String>,
    pub target_length: Option<i32>,
    pub notes: Option<String>,
    pub status: BriefStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct UpsertContentBrief {
    pub project_id: Uuid,
    pub gap_type: GapType,
    pub gap_label: String,
    #[builder(default)]
    pub platform: Option<Platform>,
    pub severity: Severity,
    pub title: String,
    #[builder(default)]
    pub key_points: Vec<String>,
    #[builder(default)]
    pub entities: Vec<String>,
    #[builder(default)]
    pub target_length: Option<i32>,
    #[builder(default)]
    pub notes: Option<String>,
}

impl ContentBrief {
    pub async fn find_by_gap(
        project_id: Uuid,
        gap_type: GapType,
        gap_label: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM content_briefs
             WHERE project_id = $1 AND gap_type = $2 AND gap_label = $3",
        )
        .bind(project_id)
        .bind(gap_type)
        .bind(gap_label)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert a brief, or overwrite the existing one for the same gap.
    /// The row always comes back as PENDING.
    pub async fn upsert(brief: &UpsertContentBrief, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO content_briefs (
                id, project_id, gap_type, gap_label, platform, severity,
                title, key_points, entities, target_length, notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'PENDING')
            ON CONFLICT (project_id, gap_type, gap_label) DO UPDATE SET
                platform = EXCLUDED.platform,
                severity = EXCLUDED.severity,
                title = EXCLUDED.title,
                key_points = EXCLUDED.key_points,
                entities = EXCLUDED.entities,
                target_length = EXCLUDED.target_length,
                notes = EXCLUDED.notes,
                status = 'PENDING',
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(brief.project_id)
        .bind(brief.gap_type)
        .bind(&brief.gap_label)
        .bind(brief.platform)
        .bind(brief.severity)
        .bind(&brief.title)
        .bind(Json(&brief.key_points))
        .bind(Json(&brief.entities))
        .bind(brief.target_length)
        .bind(&brief.notes)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
