// Trait definitions for dependency injection
//
// Infrastructure seams only. Business logic lives in domain actions that
// take these traits through WorkerDeps.
//
// Naming convention: Base* for trait names (e.g., BaseInferenceEngine)

use async_trait::async_trait;
use engine_client::{
    BriefDraft, BriefRequest, ClusterTopicsRequest, ClusterTopicsResponse, CrawlSiteRequest,
    CrawlSiteResponse, EmbedBatchRequest, EmbedBatchResponse, ExtractEntitiesRequest,
    ExtractEntitiesResponse, Result, SearchPlatformRequest, SearchPlatformResponse,
    SuggestionsRequest, SuggestionsResponse,
};

// =============================================================================
// Inference Engine Trait
// =============================================================================

#[async_trait]
pub trait BaseInferenceEngine: Send + Sync {
    async fn crawl_site(&self, request: &CrawlSiteRequest) -> Result<CrawlSiteResponse>;

    async fn search_platform(&self, request: &SearchPlatformRequest) -> Result<SearchPlatformResponse>;

    async fn extract_entities(&self, request: &ExtractEntitiesRequest) -> Result<ExtractEntitiesResponse>;

    async fn embed_batch(&self, request: &EmbedBatchRequest) -> Result<EmbedBatchResponse>;

    async fn cluster_topics(&self, request: &ClusterTopicsRequest) -> Result<ClusterTopicsResponse>;

    async fn dimension_suggestions(&self, request: &SuggestionsRequest) -> Result<SuggestionsResponse>;

    async fn generate_brief(&self, request: &BriefRequest) -> Result<BriefDraft>;
}
