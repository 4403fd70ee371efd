//! ContentEntity model - one mention of an entity in a content item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::kernel::store::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentEntity {
    pub id: Uuid,
    pub content_id: Uuid,
    pub entity_id: Uuid,
    pub salience: f64,
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ContentEntity {
    /// Upsert on `(content_id, entity_id)`. Re-extraction overwrites salience.
    pub async fn upsert(
        content_id: Uuid,
        entity_id: Uuid,
        salience: f64,
        context: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO content_entities (id, content_id, entity_id, salience, context)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (content_id, entity_id) DO UPDATE SET
                salience = EXCLUDED.salience,
                context = COALESCE(EXCLUDED.context, content_entities.context)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(content_id)
        .bind(entity_id)
        .bind(salience)
        .bind(context)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_project(project_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT ce.* FROM content_entities ce
            JOIN entities e ON e.id = ce.entity_id
            WHERE e.project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
