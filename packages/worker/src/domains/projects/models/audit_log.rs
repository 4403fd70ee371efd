//! AuditLog model
//!
//! Append-only trail of job outcomes, purged after the retention window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::kernel::store::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct CreateAuditLog {
    #[builder(default, setter(into))]
    pub user_id: Option<Uuid>,
    #[builder(default, setter(into))]
    pub project_id: Option<Uuid>,
    #[builder(setter(into))]
    pub action: String,
    #[builder(setter(into))]
    pub entity_type: String,
    #[builder(default, setter(into))]
    pub entity_id: Option<Uuid>,
    #[builder(default = json!({}))]
    pub metadata: Value,
}

impl AuditLog {
    pub async fn create(input: &CreateAuditLog, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO audit_logs (id, user_id, project_id, action, entity_type, entity_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(input.project_id)
        .bind(&input.action)
        .bind(&input.entity_type)
        .bind(input.entity_id)
        .bind(&input.metadata)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Delete rows created before `cutoff`. Returns the number removed.
    pub async fn purge_before(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
