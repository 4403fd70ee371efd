//! In-memory implementation of [`BaseStore`].
//!
//! Mirrors the natural-key upsert semantics of the Postgres models so
//! handlers can be exercised without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domains::briefs::{BriefStatus, ContentBrief, GapType, UpsertContentBrief};
use crate::domains::content::{
    normalize_label, ContentEntity, ContentItem, ContentStatus, EmbeddedContent, Entity,
    EntityType, UpsertContentItem,
};
use crate::domains::projects::{AuditLog, CreateAuditLog, CreateNotification, Notification, Project};
use crate::domains::schedules::DiscoverySchedule;
use crate::domains::scoring::ProjectScore;
use crate::kernel::jobs::{JobFamily, JobRecord, JobStatus, NewJobRecord};
use crate::kernel::store::{BaseStore, StoreError, UpsertOutcome};

#[derive(Default)]
struct State {
    projects: HashMap<Uuid, Project>,
    job_records: HashMap<(JobFamily, Uuid), JobRecord>,
    content_items: Vec<ContentItem>,
    embeddings: HashMap<Uuid, Vec<f32>>,
    entities: Vec<Entity>,
    content_entities: Vec<ContentEntity>,
    scores: HashMap<Uuid, ProjectScore>,
    briefs: Vec<ContentBrief>,
    schedules: Vec<DiscoverySchedule>,
    notifications: Vec<Notification>,
    audit_logs: Vec<AuditLog>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -------------------------------------------------------------------------
    // Seeding and inspection
    // -------------------------------------------------------------------------

    pub fn insert_project(&self, project: Project) {
        self.state().projects.insert(project.id, project);
    }

    pub fn insert_content_item(&self, item: ContentItem) {
        self.state().content_items.push(item);
    }

    pub fn set_content_status(&self, content_id: Uuid, status: ContentStatus) {
        if let Some(item) = self
            .state()
            .content_items
            .iter_mut()
            .find(|i| i.id == content_id)
        {
            item.status = status;
        }
    }

    pub fn insert_job_record(&self, family: JobFamily, record: JobRecord) {
        self.state().job_records.insert((family, record.id), record);
    }

    pub fn job_record(&self, family: JobFamily, id: Uuid) -> Option<JobRecord> {
        self.state().job_records.get(&(family, id)).cloned()
    }

    pub fn job_records(&self, family: JobFamily) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self
            .state()
            .job_records
            .iter()
            .filter(|((f, _), _)| *f == family)
            .map(|(_, r)| r.clone())
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    pub fn set_job_status(&self, family: JobFamily, id: Uuid, status: JobStatus) {
        if let Some(record) = self.state().job_records.get_mut(&(family, id)) {
            record.status = status;
        }
    }

    pub fn content_items(&self, project_id: Uuid) -> Vec<ContentItem> {
        self.state()
            .content_items
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn embedding(&self, content_id: Uuid) -> Option<Vec<f32>> {
        self.state().embeddings.get(&content_id).cloned()
    }

    pub fn entities(&self, project_id: Uuid) -> Vec<Entity> {
        self.state()
            .entities
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn content_entities(&self) -> Vec<ContentEntity> {
        self.state().content_entities.clone()
    }

    pub fn insert_score(&self, score: ProjectScore) {
        self.state().scores.insert(score.project_id, score);
    }

    pub fn briefs(&self, project_id: Uuid) -> Vec<ContentBrief> {
        self.state()
            .briefs
            .iter()
            .filter(|b| b.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn set_brief_status(&self, brief_id: Uuid, status: BriefStatus) {
        if let Some(brief) = self.state().briefs.iter_mut().find(|b| b.id == brief_id) {
            brief.status = status;
        }
    }

    pub fn insert_schedule(&self, schedule: DiscoverySchedule) {
        self.state().schedules.push(schedule);
    }

    pub fn schedule(&self, id: Uuid) -> Option<DiscoverySchedule> {
        self.state().schedules.iter().find(|s| s.id == id).cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    pub fn insert_audit_log(&self, entry: AuditLog) {
        self.state().audit_logs.push(entry);
    }

    pub fn audit_logs(&self) -> Vec<AuditLog> {
        self.state().audit_logs.clone()
    }
}

fn job_not_found(family: JobFamily, id: Uuid) -> StoreError {
    StoreError::NotFound {
        entity: family.entity_type(),
        id,
    }
}

#[async_trait]
impl BaseStore for InMemoryStore {
    async fn create_job_record(
        &self,
        family: JobFamily,
        record: NewJobRecord,
    ) -> Result<JobRecord, StoreError> {
        let created = JobRecord {
            id: Uuid::now_v7(),
            project_id: record.project_id,
            job_type: record.job_type,
            status: JobStatus::Pending,
            config: record.config,
            result_summary: None,
            error_message: None,
            retry_of: record.retry_of,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        };
        self.state()
            .job_records
            .insert((family, created.id), created.clone());
        Ok(created)
    }

    async fn get_job_record(&self, family: JobFamily, id: Uuid) -> Result<JobRecord, StoreError> {
        self.job_record(family, id)
            .ok_or_else(|| job_not_found(family, id))
    }

    async fn mark_job_running(&self, family: JobFamily, id: Uuid) -> Result<JobRecord, StoreError> {
        let mut state = self.state();
        let record = state
            .job_records
            .get_mut(&(family, id))
            .filter(|r| matches!(r.status, JobStatus::Pending | JobStatus::Running))
            .ok_or_else(|| job_not_found(family, id))?;
        record.status = JobStatus::Running;
        record.started_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn complete_job_record(
        &self,
        family: JobFamily,
        id: Uuid,
        summary: Value,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let record = state
            .job_records
            .get_mut(&(family, id))
            .filter(|r| !r.status.is_terminal())
            .ok_or_else(|| job_not_found(family, id))?;
        record.status = JobStatus::Completed;
        record.result_summary = Some(summary);
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn fail_job_record(
        &self,
        family: JobFamily,
        id: Uuid,
        error_message: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let record = state
            .job_records
            .get_mut(&(family, id))
            .filter(|r| !r.status.is_terminal())
            .ok_or_else(|| job_not_found(family, id))?;
        record.status = JobStatus::Failed;
        record.error_message = Some(error_message.to_string());
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn get_project(&self, id: Uuid) -> Result<Project, StoreError> {
        self.state()
            .projects
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "project",
                id,
            })
    }

    async fn upsert_content_item(&self, item: UpsertContentItem) -> Result<UpsertOutcome, StoreError> {
        let mut state = self.state();
        let now = Utc::now();

        if let Some(existing) = state
            .content_items
            .iter_mut()
            .find(|i| i.project_id == item.project_id && i.url == item.url)
        {
            existing.title = item.title;
            if item.raw_content.is_some() {
                existing.raw_content = item.raw_content;
            }
            if item.excerpt.is_some() {
                existing.excerpt = item.excerpt;
            }
            if item.word_count.is_some() {
                existing.word_count = item.word_count;
            }
            if item.published_at.is_some() {
                existing.published_at = item.published_at;
            }
            existing.updated_at = now;
            return Ok(UpsertOutcome::Updated);
        }

        state.content_items.push(ContentItem {
            id: Uuid::now_v7(),
            project_id: item.project_id,
            url: item.url,
            title: item.title,
            platform: item.platform,
            source_type: item.source_type,
            status: ContentStatus::Discovered,
            raw_content: item.raw_content,
            excerpt: item.excerpt,
            word_count: item.word_count,
            published_at: item.published_at,
            has_embedding: false,
            created_at: now,
            updated_at: now,
        });
        Ok(UpsertOutcome::Created)
    }

    async fn list_content_items(&self, project_id: Uuid) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self.content_items(project_id))
    }

    async fn list_items_for_extraction(
        &self,
        project_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let mut items: Vec<ContentItem> = self
            .content_items(project_id)
            .into_iter()
            .filter(|i| i.status == ContentStatus::Approved && i.has_raw_text())
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        items.truncate(limit);
        Ok(items)
    }

    async fn list_items_needing_embedding(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self
            .content_items(project_id)
            .into_iter()
            .filter(|i| !i.has_embedding && i.has_raw_text())
            .collect())
    }

    async fn set_content_embedding(&self, content_id: Uuid, embedding: Vec<f32>) -> Result<(), StoreError> {
        let mut state = self.state();
        let item = state
            .content_items
            .iter_mut()
            .find(|i| i.id == content_id)
            .ok_or(StoreError::NotFound {
                entity: "content_item",
                id: content_id,
            })?;
        item.has_embedding = true;
        state.embeddings.insert(content_id, embedding);
        Ok(())
    }

    async fn list_embedded_items(&self, project_id: Uuid) -> Result<Vec<EmbeddedContent>, StoreError> {
        let state = self.state();
        Ok(state
            .content_items
            .iter()
            .filter(|i| i.project_id == project_id)
            .filter_map(|i| {
                state.embeddings.get(&i.id).map(|embedding| EmbeddedContent {
                    id: i.id,
                    title: i.title.clone(),
                    embedding: embedding.clone(),
                })
            })
            .collect())
    }

    async fn upsert_entity(
        &self,
        project_id: Uuid,
        label: &str,
        entity_type: EntityType,
    ) -> Result<Entity, StoreError> {
        let mut state = self.state();
        let normalized = normalize_label(label);
        let now = Utc::now();

        if let Some(existing) = state.entities.iter_mut().find(|e| {
            e.project_id == project_id
                && e.normalized_label == normalized
                && e.entity_type == entity_type
        }) {
            existing.frequency += 1;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let entity = Entity {
            id: Uuid::now_v7(),
            project_id,
            label: label.trim().to_string(),
            normalized_label: normalized,
            entity_type,
            frequency: 1,
            created_at: now,
            updated_at: now,
        };
        state.entities.push(entity.clone());
        Ok(entity)
    }

    async fn upsert_content_entity(
        &self,
        content_id: Uuid,
        entity_id: Uuid,
        salience: f64,
        context: Option<&str>,
    ) -> Result<ContentEntity, StoreError> {
        let mut state = self.state();

        if let Some(existing) = state
            .content_entities
            .iter_mut()
            .find(|ce| ce.content_id == content_id && ce.entity_id == entity_id)
        {
            existing.salience = salience;
            if let Some(context) = context {
                existing.context = Some(context.to_string());
            }
            return Ok(existing.clone());
        }

        let link = ContentEntity {
            id: Uuid::now_v7(),
            content_id,
            entity_id,
            salience,
            context: context.map(str::to_string),
            created_at: Utc::now(),
        };
        state.content_entities.push(link.clone());
        Ok(link)
    }

    async fn delete_topic_entities(&self, project_id: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state();
        let doomed: Vec<Uuid> = state
            .entities
            .iter()
            .filter(|e| e.project_id == project_id && e.entity_type == EntityType::Topic)
            .map(|e| e.id)
            .collect();

        state.entities.retain(|e| !doomed.contains(&e.id));
        state
            .content_entities
            .retain(|ce| !doomed.contains(&ce.entity_id));
        Ok(doomed.len() as u64)
    }

    async fn list_entities(&self, project_id: Uuid) -> Result<Vec<Entity>, StoreError> {
        let mut entities = self.entities(project_id);
        entities.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.label.cmp(&b.label)));
        Ok(entities)
    }

    async fn list_content_entities(&self, project_id: Uuid) -> Result<Vec<ContentEntity>, StoreError> {
        let state = self.state();
        Ok(state
            .content_entities
            .iter()
            .filter(|ce| {
                state
                    .entities
                    .iter()
                    .any(|e| e.id == ce.entity_id && e.project_id == project_id)
            })
            .cloned()
            .collect())
    }

    async fn upsert_project_score(&self, score: ProjectScore) -> Result<ProjectScore, StoreError> {
        let stored = ProjectScore {
            is_stale: false,
            ..score
        };
        self.state().scores.insert(stored.project_id, stored.clone());
        Ok(stored)
    }

    async fn get_project_score(&self, project_id: Uuid) -> Result<Option<ProjectScore>, StoreError> {
        Ok(self.state().scores.get(&project_id).cloned())
    }

    async fn mark_score_stale(&self, project_id: Uuid) -> Result<(), StoreError> {
        if let Some(score) = self.state().scores.get_mut(&project_id) {
            score.is_stale = true;
        }
        Ok(())
    }

    async fn find_brief(
        &self,
        project_id: Uuid,
        gap_type: GapType,
        gap_label: &str,
    ) -> Result<Option<ContentBrief>, StoreError> {
        Ok(self
            .state()
            .briefs
            .iter()
            .find(|b| b.project_id == project_id && b.gap_type == gap_type && b.gap_label == gap_label)
            .cloned())
    }

    async fn upsert_brief(&self, brief: UpsertContentBrief) -> Result<ContentBrief, StoreError> {
        let mut state = self.state();
        let now = Utc::now();

        if let Some(existing) = state.briefs.iter_mut().find(|b| {
            b.project_id == brief.project_id
                && b.gap_type == brief.gap_type
                && b.gap_label == brief.gap_label
        }) {
            existing.platform = brief.platform;
            existing.severity = brief.severity;
            existing.title = brief.title;
            existing.key_points = brief.key_points;
            existing.entities = brief.entities;
            existing.target_length = brief.target_length;
            existing.notes = brief.notes;
            existing.status = BriefStatus::Pending;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = ContentBrief {
            id: Uuid::now_v7(),
            project_id: brief.project_id,
            gap_type: brief.gap_type,
            gap_label: brief.gap_label,
            platform: brief.platform,
            severity: brief.severity,
            title: brief.title,
            key_points: brief.key_points,
            entities: brief.entities,
            target_length: brief.target_length,
            notes: brief.notes,
            status: BriefStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.briefs.push(created.clone());
        Ok(created)
    }

    async fn list_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<DiscoverySchedule>, StoreError> {
        let mut due: Vec<DiscoverySchedule> = self
            .state()
            .schedules
            .iter()
            .filter(|s| s.enabled && s.next_run_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|s| s.next_run_at);
        Ok(due)
    }

    async fn advance_schedule(
        &self,
        id: Uuid,
        next_run_at: DateTime<Utc>,
        last_run_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let schedule = state
            .schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound {
                entity: "discovery_schedule",
                id,
            })?;
        schedule.next_run_at = next_run_at;
        schedule.last_run_at = Some(last_run_at);
        Ok(())
    }

    async fn create_notification(&self, notification: CreateNotification) -> Result<(), StoreError> {
        self.state().notifications.push(Notification {
            id: Uuid::now_v7(),
            user_id: notification.user_id,
            notification_type: notification.notification_type.as_str().to_string(),
            title: notification.title,
            message: notification.message,
            link: notification.link,
            read: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn create_audit_log(&self, entry: CreateAuditLog) -> Result<(), StoreError> {
        self.state().audit_logs.push(AuditLog {
            id: Uuid::now_v7(),
            user_id: entry.user_id,
            project_id: entry.project_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            metadata: entry.metadata,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn purge_audit_logs(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state();
        let original = state.audit_logs.len();
        state.audit_logs.retain(|entry| entry.created_at >= before);
        Ok((original - state.audit_logs.len()) as u64)
    }
}
