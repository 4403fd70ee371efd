//! Entity model
//!
//! Named things mentioned across a project's content. One row per
//! `(project_id, normalized_label, entity_type)`; `frequency` counts upserts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::kernel::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entity_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Brand,
    Person,
    Organization,
    Topic,
    Product,
    Location,
    Concept,
    Other,
}

impl EntityType {
    /// Parse an engine entity type. Unknown types map to `Other`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "BRAND" => EntityType::Brand,
            "PERSON" => EntityType::Person,
            "ORGANIZATION" | "ORG" => EntityType::Organization,
            "TOPIC" => EntityType::Topic,
            "PRODUCT" => EntityType::Product,
            "LOCATION" | "GPE" => EntityType::Location,
            "CONCEPT" => EntityType::Concept,
            _ => EntityType::Other,
        }
    }
}

/// Normalize a label for dedup: trimmed, lowercased, inner whitespace collapsed.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entity {
    pub id: Uuid,
    pub project_id: Uuid,
    pub label: String,
    pub normalized_label: String,
    pub entity_type: EntityType,
    pub frequency: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Insert with frequency 1, or increment frequency on the natural key.
    pub async fn upsert(
        project_id: Uuid,
        label: &str,
        entity_type: EntityType,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO entities (id, project_id, label, normalized_label, entity_type, frequency)
            VALUES ($1, $2, $3, $4, $5, 1)
            ON CONFLICT (project_id, normalized_label, entity_type) DO UPDATE SET
                frequency = entities.frequency + 1,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(project_id)
        .bind(label.trim())
        .bind(normalize_label(label))
        .bind(entity_type)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// All entities for a project, most frequent first.
    pub async fn find_for_project(project_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM entities WHERE project_id = $1 ORDER BY frequency DESC, label",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Remove every TOPIC entity of a project. Associations cascade.
    pub async fn delete_topics(project_id: Uuid, pool: &PgPool) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM entities WHERE project_id = $1 AND entity_type = 'TOPIC'")
            .bind(project_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Machine   Learning "), "machine learning");
        assert_eq!(normalize_label("RUST"), "rust");
    }

    #[test]
    fn test_entity_type_parse() {
        assert_eq!(EntityType::parse("topic"), EntityType::Topic);
        assert_eq!(EntityType::parse("ORG"), EntityType::Organization);
        assert_eq!(EntityType::parse("EVENT"), EntityType::Other);
    }
}
