//! Notification model
//!
//! In-app notifications written when long-running jobs finish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::kernel::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    DiscoveryCompleted,
    AnalysisCompleted,
    BriefsGenerated,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::DiscoveryCompleted => "DISCOVERY_COMPLETED",
            NotificationType::AnalysisCompleted => "ANALYSIS_COMPLETED",
            NotificationType::BriefsGenerated => "BRIEFS_GENERATED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[builder(default)]
    pub link: Option<String>,
}

impl Notification {
    pub async fn create(input: &CreateNotification, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO notifications (id, user_id, notification_type, title, message, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(input.notification_type.as_str())
        .bind(&input.title)
        .bind(&input.message)
        .bind(&input.link)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
