//! Persistence seam.
//!
//! Handlers never touch a pool directly; they go through [`BaseStore`] so the
//! same code runs against Postgres in production and [`InMemoryStore`] in
//! tests.
//!
//! [`InMemoryStore`]: crate::kernel::memory_store::InMemoryStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domains::briefs::{ContentBrief, GapType, UpsertContentBrief};
use crate::domains::content::{
    ContentEntity, ContentItem, EmbeddedContent, Entity, EntityType, UpsertContentItem,
};
use crate::domains::projects::{CreateAuditLog, CreateNotification, Project};
use crate::domains::schedules::DiscoverySchedule;
use crate::domains::scoring::ProjectScore;
use crate::kernel::jobs::{JobFamily, JobRecord, NewJobRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted row does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Whether an upsert inserted a new row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[async_trait]
pub trait BaseStore: Send + Sync {
    // -------------------------------------------------------------------------
    // Job records
    // -------------------------------------------------------------------------

    async fn create_job_record(
        &self,
        family: JobFamily,
        record: NewJobRecord,
    ) -> Result<JobRecord, StoreError>;

    async fn get_job_record(&self, family: JobFamily, id: Uuid) -> Result<JobRecord, StoreError>;

    /// PENDING/RUNNING → RUNNING, stamping `started_at`.
    async fn mark_job_running(&self, family: JobFamily, id: Uuid) -> Result<JobRecord, StoreError>;

    /// RUNNING → COMPLETED with the serialized summary.
    async fn complete_job_record(
        &self,
        family: JobFamily,
        id: Uuid,
        summary: Value,
    ) -> Result<(), StoreError>;

    /// PENDING/RUNNING → FAILED with a human-readable message.
    async fn fail_job_record(
        &self,
        family: JobFamily,
        id: Uuid,
        error_message: &str,
    ) -> Result<(), StoreError>;

    // -------------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------------

    async fn get_project(&self, id: Uuid) -> Result<Project, StoreError>;

    // -------------------------------------------------------------------------
    // Content
    // -------------------------------------------------------------------------

    async fn upsert_content_item(&self, item: UpsertContentItem) -> Result<UpsertOutcome, StoreError>;

    async fn list_content_items(&self, project_id: Uuid) -> Result<Vec<ContentItem>, StoreError>;

    async fn list_items_for_extraction(
        &self,
        project_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError>;

    async fn list_items_needing_embedding(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<ContentItem>, StoreError>;

    async fn set_content_embedding(&self, content_id: Uuid, embedding: Vec<f32>) -> Result<(), StoreError>;

    async fn list_embedded_items(&self, project_id: Uuid) -> Result<Vec<EmbeddedContent>, StoreError>;

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    /// Create with frequency 1 or increment frequency on the natural key.
    async fn upsert_entity(
        &self,
        project_id: Uuid,
        label: &str,
        entity_type: EntityType,
    ) -> Result<Entity, StoreError>;

    async fn upsert_content_entity(
        &self,
        content_id: Uuid,
        entity_id: Uuid,
        salience: f64,
        context: Option<&str>,
    ) -> Result<ContentEntity, StoreError>;

    async fn delete_topic_entities(&self, project_id: Uuid) -> Result<u64, StoreError>;

    async fn list_entities(&self, project_id: Uuid) -> Result<Vec<Entity>, StoreError>;

    async fn list_content_entities(&self, project_id: Uuid) -> Result<Vec<ContentEntity>, StoreError>;

    // -------------------------------------------------------------------------
    // Scores
    // -------------------------------------------------------------------------

    async fn upsert_project_score(&self, score: ProjectScore) -> Result<ProjectScore, StoreError>;

    async fn get_project_score(&self, project_id: Uuid) -> Result<Option<ProjectScore>, StoreError>;

    async fn mark_score_stale(&self, project_id: Uuid) -> Result<(), StoreError>;

    // -------------------------------------------------------------------------
    // Briefs
    // -------------------------------------------------------------------------

    async fn find_brief(
        &self,
        project_id: Uuid,
        gap_type: GapType,
        gap_label: &str,
    ) -> Result<Option<ContentBrief>, StoreError>;

    async fn upsert_brief(&self, brief: UpsertContentBrief) -> Result<ContentBrief, StoreError>;

    // -------------------------------------------------------------------------
    // Schedules
    // -------------------------------------------------------------------------

    async fn list_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<DiscoverySchedule>, StoreError>;

    async fn advance_schedule(
        &self,
        id: Uuid,
        next_run_at: DateTime<Utc>,
        last_run_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // -------------------------------------------------------------------------
    // Side effects
    // -------------------------------------------------------------------------

    async fn create_notification(&self, notification: CreateNotification) -> Result<(), StoreError>;

    async fn create_audit_log(&self, entry: CreateAuditLog) -> Result<(), StoreError>;

    async fn purge_audit_logs(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;
}
