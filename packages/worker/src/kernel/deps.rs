//! Worker dependencies for job handlers (using traits for testability)

use std::sync::Arc;

use async_trait::async_trait;
use engine_client::{
    BriefDraft, BriefRequest, ClusterTopicsRequest, ClusterTopicsResponse, CrawlSiteRequest,
    CrawlSiteResponse, EmbedBatchRequest, EmbedBatchResponse, EngineClient,
    ExtractEntitiesRequest, ExtractEntitiesResponse, Result, SearchPlatformRequest,
    SearchPlatformResponse, SuggestionsRequest, SuggestionsResponse,
};
use typed_builder::TypedBuilder;

use crate::kernel::jobs::BaseJobQueue;
use crate::kernel::store::BaseStore;
use crate::kernel::BaseInferenceEngine;

// =============================================================================
// EngineClient Adapter (implements BaseInferenceEngine trait)
// =============================================================================

/// Wrapper around EngineClient that implements BaseInferenceEngine
pub struct EngineAdapter(pub EngineClient);

impl EngineAdapter {
    pub fn new(client: EngineClient) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseInferenceEngine for EngineAdapter {
    async fn crawl_site(&self, request: &CrawlSiteRequest) -> Result<CrawlSiteResponse> {
        self.0.crawl_site(request).await
    }

    async fn search_platform(&self, request: &SearchPlatformRequest) -> Result<SearchPlatformResponse> {
        self.0.search_platform(request).await
    }

    async fn extract_entities(&self, request: &ExtractEntitiesRequest) -> Result<ExtractEntitiesResponse> {
        self.0.extract_entities(request).await
    }

    async fn embed_batch(&self, request: &EmbedBatchRequest) -> Result<EmbedBatchResponse> {
        self.0.embed_batch(request).await
    }

    async fn cluster_topics(&self, request: &ClusterTopicsRequest) -> Result<ClusterTopicsResponse> {
        self.0.cluster_topics(request).await
    }

    async fn dimension_suggestions(&self, request: &SuggestionsRequest) -> Result<SuggestionsResponse> {
        self.0.dimension_suggestions(request).await
    }

    async fn generate_brief(&self, request: &BriefRequest) -> Result<BriefDraft> {
        self.0.generate_brief(request).await
    }
}

// =============================================================================
// WorkerDeps
// =============================================================================

/// Dependencies shared by every job handler
#[derive(Clone, TypedBuilder)]
pub struct WorkerDeps {
    pub store: Arc<dyn BaseStore>,
    pub engine: Arc<dyn BaseInferenceEngine>,
    /// Used by handlers that fan out follow-up jobs (schedule advancement)
    pub queue: Arc<dyn BaseJobQueue>,
    #[builder(default = 90)]
    pub audit_retention_days: i64,
}
