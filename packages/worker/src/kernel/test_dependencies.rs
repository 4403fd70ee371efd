// TestDependencies - mock implementations for testing

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use engine_client::{
    BriefDraft, BriefRequest, ClusterAssignment, ClusterTopicsRequest, ClusterTopicsResponse,
    CrawlSiteRequest, CrawlSiteResponse, EmbedBatchRequest, EmbedBatchResponse, EmbeddedItem,
    EngineError, ExtractEntitiesRequest, ExtractEntitiesResponse, ItemEntities, Result,
    SearchPlatformRequest, SearchPlatformResponse, SuggestionsRequest, SuggestionsResponse,
};
use uuid::Uuid;

use crate::domains::content::{ContentItem, ContentStatus, Platform, SourceType};
use crate::domains::projects::Project;
use crate::kernel::jobs::{InMemoryJobQueue, JobFamily, JobRecord, JobStatus};
use crate::kernel::memory_store::InMemoryStore;
use crate::kernel::{BaseInferenceEngine, WorkerDeps};

/// Dimensions of mock embeddings.
pub const MOCK_EMBEDDING_DIMENSIONS: usize = 384;

// =============================================================================
// Mock Inference Engine
// =============================================================================

/// A recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Crawl { url: String },
    Search { brand: String, platforms: Vec<String> },
    Extract { items: usize },
    Embed { items: usize },
    Cluster { items: usize },
    Suggestions { weak: Vec<String> },
    Brief { gap_label: String },
}

type Replies<T> = Mutex<VecDeque<Result<T>>>;

/// Engine double. Queued replies are served first; once a queue is empty
/// each endpoint falls back to a permissive default.
#[derive(Default)]
pub struct MockEngine {
    crawl: Replies<CrawlSiteResponse>,
    search: Replies<SearchPlatformResponse>,
    extract: Replies<ExtractEntitiesResponse>,
    embed: Replies<EmbedBatchResponse>,
    cluster: Replies<ClusterTopicsResponse>,
    suggestions: Replies<SuggestionsResponse>,
    briefs: Replies<BriefDraft>,
    calls: Mutex<Vec<EngineCall>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crawl(self, reply: Result<CrawlSiteResponse>) -> Self {
        self.crawl.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_search(self, reply: Result<SearchPlatformResponse>) -> Self {
        self.search.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_extract(self, reply: Result<ExtractEntitiesResponse>) -> Self {
        self.extract.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_embed(self, reply: Result<EmbedBatchResponse>) -> Self {
        self.embed.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_cluster(self, reply: Result<ClusterTopicsResponse>) -> Self {
        self.cluster.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_suggestions(self, reply: Result<SuggestionsResponse>) -> Self {
        self.suggestions.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_brief(self, reply: Result<BriefDraft>) -> Self {
        self.briefs.lock().unwrap().push_back(reply);
        self
    }

    /// All calls in order
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cluster_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::Cluster { .. }))
            .count()
    }

    pub fn brief_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Brief { gap_label } => Some(gap_label),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(replies: &Replies<T>) -> Option<Result<T>> {
        replies.lock().unwrap().pop_front()
    }
}

/// Engine unreachable error for tests.
pub fn unreachable(message: &str) -> EngineError {
    EngineError::Unreachable(message.to_string())
}

#[async_trait]
impl BaseInferenceEngine for MockEngine {
    async fn crawl_site(&self, request: &CrawlSiteRequest) -> Result<CrawlSiteResponse> {
        self.record(EngineCall::Crawl {
            url: request.url.clone(),
        });
        Self::next(&self.crawl).unwrap_or_else(|| {
            Ok(CrawlSiteResponse {
                pages: vec![],
                crawled_count: 0,
                error_count: 0,
                errors: vec![],
            })
        })
    }

    async fn search_platform(&self, request: &SearchPlatformRequest) -> Result<SearchPlatformResponse> {
        self.record(EngineCall::Search {
            brand: request.brand.clone(),
            platforms: request.platforms.clone(),
        });
        Self::next(&self.search).unwrap_or_else(|| {
            Ok(SearchPlatformResponse {
                results: vec![],
                total_found: 0,
                errors: vec![],
            })
        })
    }

    async fn extract_entities(&self, request: &ExtractEntitiesRequest) -> Result<ExtractEntitiesResponse> {
        self.record(EngineCall::Extract {
            items: request.items.len(),
        });
        Self::next(&self.extract).unwrap_or_else(|| {
            Ok(ExtractEntitiesResponse {
                results: request
                    .items
                    .iter()
                    .map(|item| ItemEntities {
                        id: item.id.clone(),
                        entities: vec![],
                        error: None,
                    })
                    .collect(),
            })
        })
    }

    async fn embed_batch(&self, request: &EmbedBatchRequest) -> Result<EmbedBatchResponse> {
        self.record(EngineCall::Embed {
            items: request.items.len(),
        });
        Self::next(&self.embed).unwrap_or_else(|| {
            Ok(EmbedBatchResponse {
                results: request
                    .items
                    .iter()
                    .map(|item| EmbeddedItem {
                        id: item.id.clone(),
                        embedding: vec![0.1; MOCK_EMBEDDING_DIMENSIONS],
                        error: None,
                    })
                    .collect(),
                dimensions: MOCK_EMBEDDING_DIMENSIONS,
            })
        })
    }

    async fn cluster_topics(&self, request: &ClusterTopicsRequest) -> Result<ClusterTopicsResponse> {
        self.record(EngineCall::Cluster {
            items: request.items.len(),
        });
        Self::next(&self.cluster).unwrap_or_else(|| {
            Ok(ClusterTopicsResponse {
                assignments: request
                    .items
                    .iter()
                    .map(|item| ClusterAssignment {
                        id: item.id.clone(),
                        cluster_idx: 0,
                        topic_label: "General".to_string(),
                        confidence: 1.0,
                    })
                    .collect(),
                clusters_found: 1,
                error: None,
            })
        })
    }

    async fn dimension_suggestions(&self, request: &SuggestionsRequest) -> Result<SuggestionsResponse> {
        self.record(EngineCall::Suggestions {
            weak: request
                .weak_dimensions
                .iter()
                .map(|d| d.name.clone())
                .collect(),
        });
        Self::next(&self.suggestions).unwrap_or_else(|| Ok(SuggestionsResponse { suggestions: vec![] }))
    }

    async fn generate_brief(&self, request: &BriefRequest) -> Result<BriefDraft> {
        self.record(EngineCall::Brief {
            gap_label: request.gap_label.clone(),
        });
        Self::next(&self.briefs).unwrap_or_else(|| {
            Ok(BriefDraft {
                title: format!("Brief: {}", request.gap_label),
                key_points: vec!["Cover the basics".to_string()],
                entities: request.top_entities.clone(),
                target_length: Some(1200),
                notes: None,
            })
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn project(user_id: Uuid) -> Project {
    Project {
        id: Uuid::new_v4(),
        user_id,
        name: "Acme".to_string(),
        domain: Some("acme.test".to_string()),
        created_at: Utc::now(),
    }
}

/// An approved website item with no text. Tweak fields as needed.
pub fn content_item(project_id: Uuid, url: &str) -> ContentItem {
    let now = Utc::now();
    ContentItem {
        id: Uuid::new_v4(),
        project_id,
        url: url.to_string(),
        title: format!("Title for {url}"),
        platform: Platform::Website,
        source_type: SourceType::Manual,
        status: ContentStatus::Approved,
        raw_content: None,
        excerpt: None,
        word_count: None,
        published_at: None,
        has_embedding: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn pending_record(project_id: Uuid, job_type: &str) -> JobRecord {
    JobRecord {
        id: Uuid::new_v4(),
        project_id,
        job_type: job_type.to_string(),
        status: JobStatus::Pending,
        config: serde_json::json!({}),
        result_summary: None,
        error_message: None,
        retry_of: None,
        started_at: None,
        completed_at: None,
        created_at: Utc::now(),
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of in-memory collaborators with handles kept for assertions.
pub struct TestDependencies {
    pub store: Arc<InMemoryStore>,
    pub engine: Arc<MockEngine>,
    pub queue: Arc<InMemoryJobQueue>,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            engine: Arc::new(MockEngine::new()),
            queue: Arc::new(InMemoryJobQueue::new()),
        }
    }

    pub fn with_engine(mut self, engine: MockEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn with_queue(mut self, queue: InMemoryJobQueue) -> Self {
        self.queue = Arc::new(queue);
        self
    }

    /// Seed a project owned by a fresh user.
    pub fn seed_project(&self) -> Project {
        let project = project(Uuid::new_v4());
        self.store.insert_project(project.clone());
        project
    }

    /// Seed a PENDING record for `job_type`.
    pub fn seed_record(&self, family: JobFamily, project_id: Uuid, job_type: &str) -> JobRecord {
        let record = pending_record(project_id, job_type);
        self.store.insert_job_record(family, record.clone());
        record
    }

    pub fn into_deps(&self) -> Arc<WorkerDeps> {
        Arc::new(
            WorkerDeps::builder()
                .store(self.store.clone())
                .engine(self.engine.clone())
                .queue(self.queue.clone())
                .build(),
        )
    }
}
