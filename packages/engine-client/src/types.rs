//! Engine request and response types.
//!
//! Field names follow the engine's snake_case JSON contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Crawl
// =============================================================================

/// Crawl a site starting from `url`, following internal links.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSiteRequest {
    pub url: String,
    pub max_depth: u32,
    pub max_pages: u32,
    /// Requests per second against the target site
    pub rate_limit: f64,
}

impl CrawlSiteRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_depth: 2,
            max_pages: 50,
            rate_limit: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub raw_content: Option<String>,
    pub word_count: Option<i32>,
    pub excerpt: Option<String>,
    /// ISO-8601 date or datetime as found in the page metadata
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSiteResponse {
    pub pages: Vec<CrawledPage>,
    pub crawled_count: u32,
    pub error_count: u32,
    #[serde(default)]
    pub errors: Vec<BTreeMap<String, String>>,
}

// =============================================================================
// Search
// =============================================================================

/// Search for brand mentions across platforms.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPlatformRequest {
    pub brand: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub platforms: Vec<String>,
    pub max_results_per_platform: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: Option<String>,
    pub platform: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPlatformResponse {
    pub results: Vec<SearchHit>,
    pub total_found: u32,
    #[serde(default)]
    pub errors: Vec<BTreeMap<String, String>>,
}

// =============================================================================
// Entity extraction
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ExtractItem {
    pub id: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractEntitiesRequest {
    pub items: Vec<ExtractItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedEntity {
    pub label: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub salience: f64,
    pub context: Option<String>,
}

/// Per-item extraction result. `error` is set when this item failed.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemEntities {
    pub id: String,
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractEntitiesResponse {
    pub results: Vec<ItemEntities>,
}

// =============================================================================
// Embeddings
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct EmbedItem {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedBatchRequest {
    pub items: Vec<EmbedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedItem {
    pub id: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedBatchResponse {
    pub results: Vec<EmbeddedItem>,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_dimensions() -> usize {
    384
}

// =============================================================================
// Topic clustering
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ClusterItem {
    pub id: String,
    pub title: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterTopicsRequest {
    pub items: Vec<ClusterItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterAssignment {
    pub id: String,
    pub cluster_idx: i32,
    pub topic_label: String,
    pub confidence: f64,
}

/// Clustering result. A soft failure ("not enough items") comes back as a
/// 200 with `error` set and no assignments.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterTopicsResponse {
    #[serde(default)]
    pub assignments: Vec<ClusterAssignment>,
    pub clusters_found: u32,
    pub error: Option<String>,
}

// =============================================================================
// Generation
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WeakDimension {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsRequest {
    pub project_name: String,
    pub dimensions: BTreeMap<String, f64>,
    /// Weakest first
    pub weak_dimensions: Vec<WeakDimension>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BriefRequest {
    pub project_name: String,
    pub gap_type: String,
    pub gap_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    pub severity: String,
    pub top_entities: Vec<String>,
    pub recent_titles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefDraft {
    pub title: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    pub target_length: Option<i32>,
    pub notes: Option<String>,
}

/// Error body returned by the engine on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}
