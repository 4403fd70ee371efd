use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::kernel::store::StoreError;

/// A tracked brand or site. Owned by the API layer; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "project",
                id,
            })
    }
}
