//! ContentItem model
//!
//! A piece of project-owned content found by discovery or added by hand.

use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::kernel::store::{StoreError, UpsertOutcome};

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_platform", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Substack,
    Medium,
    Linkedin,
    Reddit,
    Youtube,
    Twitter,
    Quora,
    News,
    Website,
    Other,
}

impl Platform {
    /// Platforms every brand is expected to show up on.
    pub const KEY_PLATFORMS: [Platform; 6] = [
        Platform::Linkedin,
        Platform::Medium,
        Platform::Substack,
        Platform::News,
        Platform::Youtube,
        Platform::Reddit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Substack => "SUBSTACK",
            Platform::Medium => "MEDIUM",
            Platform::Linkedin => "LINKEDIN",
            Platform::Reddit => "REDDIT",
            Platform::Youtube => "YOUTUBE",
            Platform::Twitter => "TWITTER",
            Platform::Quora => "QUORA",
            Platform::News => "NEWS",
            Platform::Website => "WEBSITE",
            Platform::Other => "OTHER",
        }
    }

    /// Parse an engine platform label. Unknown labels map to `Other`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "SUBSTACK" => Platform::Substack,
            "MEDIUM" => Platform::Medium,
            "LINKEDIN" => Platform::Linkedin,
            "REDDIT" => Platform::Reddit,
            "YOUTUBE" => Platform::Youtube,
            "TWITTER" | "X" => Platform::Twitter,
            "QUORA" => Platform::Quora,
            "NEWS" => Platform::News,
            "WEBSITE" => Platform::Website,
            _ => Platform::Other,
        }
    }

    /// Fixed authority weight used by the scoring engine.
    pub fn authority(&self) -> f64 {
        match self {
            Platform::News => 100.0,
            Platform::Linkedin => 80.0,
            Platform::Medium | Platform::Substack => 75.0,
            Platform::Youtube | Platform::Website => 70.0,
            Platform::Reddit => 55.0,
            Platform::Quora | Platform::Twitter => 50.0,
            Platform::Other => 30.0,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_source", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Crawl,
    Search,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    #[default]
    Discovered,
    Approved,
    Rejected,
    Archived,
}

impl ContentStatus {
    /// Rejected and archived items are invisible to analysis.
    pub fn is_active(&self) -> bool {
        matches!(self, ContentStatus::Discovered | ContentStatus::Approved)
    }
}

// =============================================================================
// Model
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub url: String,
    pub title: String,
    pub platform: Platform,
    pub source_type: SourceType,
    pub status: ContentStatus,
    pub raw_content: Option<String>,
    pub excerpt: Option<String>,
    pub word_count: Option<i32>,
    pub published_at: Option<DateTime<Utc>>,
    pub has_embedding: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// True when the item carries non-blank raw text.
    pub fn has_raw_text(&self) -> bool {
        self.raw_content
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

/// Item with its embedding, as sent to topic clustering.
#[derive(Debug, Clone)]
pub struct EmbeddedContent {
    pub id: Uuid,
    pub title: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct UpsertContentItem {
    pub project_id: Uuid,
    pub url: String,
    pub title: String,
    pub platform: Platform,
    pub source_type: SourceType,
    #[builder(default)]
    pub raw_content: Option<String>,
    #[builder(default)]
    pub excerpt: Option<String>,
    #[builder(default)]
    pub word_count: Option<i32>,
    #[builder(default)]
    pub published_at: Option<DateTime<Utc>>,
}

const COLUMNS: &str = "id, project_id, url, title, platform, source_type, status, raw_content, \
     excerpt, word_count, published_at, (embedding IS NOT NULL) AS has_embedding, \
     created_at, updated_at";

impl ContentItem {
    /// Insert or refresh an item keyed by `(project_id, url)`.
    ///
    /// Re-discovery refreshes metadata but leaves `status`, `platform` and
    /// `embedding` untouched.
    pub async fn upsert(item: &UpsertContentItem, pool: &PgPool) -> Result<UpsertOutcome, StoreError> {
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO content_items (
                id, project_id, url, title, platform, source_type,
                raw_content, excerpt, word_count, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (project_id, url) DO UPDATE SET
                title = EXCLUDED.title,
                raw_content = COALESCE(EXCLUDED.raw_content, content_items.raw_content),
                excerpt = COALESCE(EXCLUDED.excerpt, content_items.excerpt),
                word_count = COALESCE(EXCLUDED.word_count, content_items.word_count),
                published_at = COALESCE(EXCLUDED.published_at, content_items.published_at),
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(item.project_id)
        .bind(&item.url)
        .bind(&item.title)
        .bind(item.platform)
        .bind(item.source_type)
        .bind(&item.raw_content)
        .bind(&item.excerpt)
        .bind(item.word_count)
        .bind(item.published_at)
        .fetch_one(pool)
        .await?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    pub async fn find_for_project(project_id: Uuid, pool: &PgPool) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM content_items WHERE project_id = $1 ORDER BY created_at"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Approved items with raw text, most recently updated first.
    pub async fn find_for_extraction(
        project_id: Uuid,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM content_items
             WHERE project_id = $1
               AND status = 'APPROVED'
               AND raw_content IS NOT NULL
               AND btrim(raw_content) <> ''
             ORDER BY updated_at DESC
             LIMIT $2"
        ))
        .bind(project_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Items with raw text but no embedding yet.
    pub async fn find_needing_embedding(
        project_id: Uuid,
        pool: &PgPool,
    ) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM content_items
             WHERE project_id = $1
               AND embedding IS NULL
               AND raw_content IS NOT NULL
               AND btrim(raw_content) <> ''
             ORDER BY created_at"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn set_embedding(id: Uuid, embedding: Vec<f32>, pool: &PgPool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE content_items SET embedding = $2 WHERE id = $1")
            .bind(id)
            .bind(Vector::from(embedding))
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "content_item",
                id,
            });
        }
        Ok(())
    }

    pub async fn find_embedded(project_id: Uuid, pool: &PgPool) -> Result<Vec<EmbeddedContent>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, String, Vector)>(
            "SELECT id, title, embedding FROM content_items
             WHERE project_id = $1 AND embedding IS NOT NULL
             ORDER BY created_at",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, embedding)| EmbeddedContent {
                id,
                title,
                embedding: embedding.to_vec(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_is_lenient() {
        assert_eq!(Platform::parse("linkedin"), Platform::Linkedin);
        assert_eq!(Platform::parse(" News "), Platform::News);
        assert_eq!(Platform::parse("X"), Platform::Twitter);
        assert_eq!(Platform::parse("mastodon"), Platform::Other);
    }

    #[test]
    fn test_authority_table() {
        assert_eq!(Platform::News.authority(), 100.0);
        assert_eq!(Platform::Website.authority(), 70.0);
        assert_eq!(Platform::Other.authority(), 30.0);
    }

    #[test]
    fn test_only_discovered_and_approved_are_active() {
        assert!(ContentStatus::Discovered.is_active());
        assert!(ContentStatus::Approved.is_active());
        assert!(!ContentStatus::Rejected.is_active());
        assert!(!ContentStatus::Archived.is_active());
    }
}
