//! Postgres implementation of [`BaseStore`].
//!
//! Thin delegation: the SQL lives on the model types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::briefs::{ContentBrief, GapType, UpsertContentBrief};
use crate::domains::content::{
    ContentEntity, ContentItem, EmbeddedContent, Entity, EntityType, UpsertContentItem,
};
use crate::domains::projects::{AuditLog, CreateAuditLog, CreateNotification, Notification, Project};
use crate::domains::schedules::DiscoverySchedule;
use crate::domains::scoring::ProjectScore;
use crate::kernel::jobs::{JobFamily, JobRecord, NewJobRecord};
use crate::kernel::store::{BaseStore, StoreError, UpsertOutcome};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseStore for PostgresStore {
    async fn create_job_record(
        &self,
        family: JobFamily,
        record: NewJobRecord,
    ) -> Result<JobRecord, StoreError> {
        JobRecord::create(family, &record, &self.pool).await
    }

    async fn get_job_record(&self, family: JobFamily, id: Uuid) -> Result<JobRecord, StoreError> {
        JobRecord::find_by_id(family, id, &self.pool).await
    }

    async fn mark_job_running(&self, family: JobFamily, id: Uuid) -> Result<JobRecord, StoreError> {
        JobRecord::mark_running(family, id, &self.pool).await
    }

    async fn complete_job_record(
        &self,
        family: JobFamily,
        id: Uuid,
        summary: Value,
    ) -> Result<(), StoreError> {
        JobRecord::mark_completed(family, id, &summary, &self.pool).await
    }

    async fn fail_job_record(
        &self,
        family: JobFamily,
        id: Uuid,
        error_message: &str,
    ) -> Result<(), StoreError> {
        JobRecord::mark_failed(family, id, error_message, &self.pool).await
    }

    async fn get_project(&self, id: Uuid) -> Result<Project, StoreError> {
        Project::find_by_id(id, &self.pool).await
    }

    async fn upsert_content_item(&self, item: UpsertContentItem) -> Result<UpsertOutcome, StoreError> {
        ContentItem::upsert(&item, &self.pool).await
    }

    async fn list_content_items(&self, project_id: Uuid) -> Result<Vec<ContentItem>, StoreError> {
        ContentItem::find_for_project(project_id, &self.pool).await
    }

    async fn list_items_for_extraction(
        &self,
        project_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError> {
        ContentItem::find_for_extraction(project_id, limit as i64, &self.pool).await
    }

    async fn list_items_needing_embedding(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<ContentItem>, StoreError> {
        ContentItem::find_needing_embedding(project_id, &self.pool).await
    }

    async fn set_content_embedding(&self, content_id: Uuid, embedding: Vec<f32>) -> Result<(), StoreError> {
        ContentItem::set_embedding(content_id, embedding, &self.pool).await
    }

    async fn list_embedded_items(&self, project_id: Uuid) -> Result<Vec<EmbeddedContent>, StoreError> {
        ContentItem::find_embedded(project_id, &self.pool).await
    }

    async fn upsert_entity(
        &self,
        project_id: Uuid,
        label: &str,
        entity_type: EntityType,
    ) -> Result<Entity, StoreError> {
        Entity::upsert(project_id, label, entity_type, &self.pool).await
    }

    async fn upsert_content_entity(
        &self,
        content_id: Uuid,
        entity_id: Uuid,
        salience: f64,
        context: Option<&str>,
    ) -> Result<ContentEntity, StoreError> {
        ContentEntity::upsert(content_id, entity_id, salience, context, &self.pool).await
    }

    async fn delete_topic_entities(&self, project_id: Uuid) -> Result<u64, StoreError> {
        Entity::delete_topics(project_id, &self.pool).await
    }

    async fn list_entities(&self, project_id: Uuid) -> Result<Vec<Entity>, StoreError> {
        Entity::find_for_project(project_id, &self.pool).await
    }

    async fn list_content_entities(&self, project_id: Uuid) -> Result<Vec<ContentEntity>, StoreError> {
        ContentEntity::find_for_project(project_id, &self.pool).await
    }

    async fn upsert_project_score(&self, score: ProjectScore) -> Result<ProjectScore, StoreError> {
        ProjectScore::upsert(&score, &self.pool).await
    }

    async fn get_project_score(&self, project_id: Uuid) -> Result<Option<ProjectScore>, StoreError> {
        ProjectScore::find_for_project(project_id, &self.pool).await
    }

    async fn mark_score_stale(&self, project_id: Uuid) -> Result<(), StoreError> {
        ProjectScore::mark_stale(project_id, &self.pool).await
    }

    async fn find_brief(
        &self,
        project_id: Uuid,
        gap_type: GapType,
        gap_label: &str,
    ) -> Result<Option<ContentBrief>, StoreError> {
        ContentBrief::find_by_gap(project_id, gap_type, gap_label, &self.pool).await
    }

    async fn upsert_brief(&self, brief: UpsertContentBrief) -> Result<ContentBrief, StoreError> {
        ContentBrief::upsert(&brief, &self.pool).await
    }

    async fn list_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<DiscoverySchedule>, StoreError> {
        DiscoverySchedule::find_due(now, &self.pool).await
    }

    async fn advance_schedule(
        &self,
        id: Uuid,
        next_run_at: DateTime<Utc>,
        last_run_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        DiscoverySchedule::advance(id, next_run_at, last_run_at, &self.pool).await
    }

    async fn create_notification(&self, notification: CreateNotification) -> Result<(), StoreError> {
        Notification::create(&notification, &self.pool).await.map(|_| ())
    }

    async fn create_audit_log(&self, entry: CreateAuditLog) -> Result<(), StoreError> {
        AuditLog::create(&entry, &self.pool).await.map(|_| ())
    }

    async fn purge_audit_logs(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        AuditLog::purge_before(before, &self.pool).await
    }
}
