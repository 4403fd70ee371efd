//! Job record model.
//!
//! A job record is the durable, user-visible row for one dispatched unit of
//! work. Discovery and analysis jobs live in separate tables with the same
//! shape; [`JobFamily`] picks the table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::kernel::store::StoreError;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// COMPLETED, FAILED and CANCELLED never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobFamily {
    Discovery,
    Analysis,
}

impl JobFamily {
    pub fn table_name(&self) -> &'static str {
        match self {
            JobFamily::Discovery => "discovery_jobs",
            JobFamily::Analysis => "analysis_jobs",
        }
    }

    /// Entity type recorded in the audit trail.
    pub fn entity_type(&self) -> &'static str {
        match self {
            JobFamily::Discovery => "discovery_job",
            JobFamily::Analysis => "analysis_job",
        }
    }
}

// ============================================================================
// Job Record Model
// ============================================================================

#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub job_type: String,
    pub status: JobStatus,
    pub config: Value,
    pub result_summary: Option<Value>,
    pub error_message: Option<String>,
    pub retry_of: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewJobRecord {
    pub project_id: Uuid,
    pub job_type: String,
    #[builder(default = Value::Object(Default::default()))]
    pub config: Value,
    #[builder(default)]
    pub retry_of: Option<Uuid>,
}

impl NewJobRecord {
    /// A fresh PENDING record that retries `record`.
    pub fn retry_of(record: &JobRecord) -> Self {
        Self {
            project_id: record.project_id,
            job_type: record.job_type.clone(),
            config: record.config.clone(),
            retry_of: Some(record.id),
        }
    }
}

fn not_found(family: JobFamily, id: Uuid) -> StoreError {
    StoreError::NotFound {
        entity: family.entity_type(),
        id,
    }
}

impl JobRecord {
    pub async fn create(
        family: JobFamily,
        record: &NewJobRecord,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO {} (id, project_id, job_type, status, config, retry_of)
             VALUES ($1, $2, $3, 'PENDING', $4, $5)
             RETURNING *",
            family.table_name()
        ))
        .bind(Uuid::now_v7())
        .bind(record.project_id)
        .bind(&record.job_type)
        .bind(&record.config)
        .bind(record.retry_of)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(family: JobFamily, id: Uuid, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT * FROM {} WHERE id = $1",
            family.table_name()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(family, id))
    }

    pub async fn mark_running(family: JobFamily, id: Uuid, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(&format!(
            "UPDATE {}
             SET status = 'RUNNING', started_at = NOW()
             WHERE id = $1 AND status IN ('PENDING', 'RUNNING')
             RETURNING *",
            family.table_name()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(family, id))
    }

    pub async fn mark_completed(
        family: JobFamily,
        id: Uuid,
        summary: &Value,
        pool: &PgPool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(&format!(
            "UPDATE {}
             SET status = 'COMPLETED', result_summary = $2, completed_at = NOW()
             WHERE id = $1 AND status IN ('PENDING', 'RUNNING')",
            family.table_name()
        ))
        .bind(id)
        .bind(summary)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(family, id));
        }
        Ok(())
    }

    pub async fn mark_failed(
        family: JobFamily,
        id: Uuid,
        error_message: &str,
        pool: &PgPool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(&format!(
            "UPDATE {}
             SET status = 'FAILED', error_message = $2, completed_at = NOW()
             WHERE id = $1 AND status IN ('PENDING', 'RUNNING')",
            family.table_name()
        ))
        .bind(id)
        .bind(error_message)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(family, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_retry_record_points_at_original() {
        let original = JobRecord {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            job_type: "CRAWL_SITE".into(),
            status: JobStatus::Failed,
            config: serde_json::json!({"url": "https://example.com"}),
            result_summary: None,
            error_message: Some("EngineUnavailable: timeout".into()),
            retry_of: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        };

        let retry = NewJobRecord::retry_of(&original);
        assert_eq!(retry.retry_of, Some(original.id));
        assert_eq!(retry.project_id, original.project_id);
        assert_eq!(retry.config, original.config);
    }
}
