//! HTTP client for the content inference engine.
//!
//! The engine does the heavy lifting (crawling, search, entity extraction,
//! embeddings, clustering, text generation). This crate only speaks its JSON
//! contract and maps failures into [`EngineError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use engine_client::{EngineClient, EmbedBatchRequest, EmbedItem};
//!
//! let client = EngineClient::from_env()?;
//! let resp = client
//!     .embed_batch(&EmbedBatchRequest {
//!         items: vec![EmbedItem { id: "a".into(), text: "hello".into() }],
//!     })
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{EngineError, Result};
pub use types::*;

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Header carrying the shared engine secret.
pub const API_KEY_HEADER: &str = "x-engine-api-key";

pub const CRAWL_TIMEOUT: Duration = Duration::from_secs(300);
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(120);
pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(600);
pub const EMBED_BATCH_TIMEOUT: Duration = Duration::from_secs(120);
pub const CLUSTER_TIMEOUT: Duration = Duration::from_secs(180);
pub const SUGGESTIONS_TIMEOUT: Duration = Duration::from_secs(30);
pub const BRIEF_TIMEOUT: Duration = Duration::from_secs(60);

/// Inference engine client.
#[derive(Clone)]
pub struct EngineClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl EngineClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "http://localhost:8000".to_string(),
        }
    }

    /// Create from `ENGINE_API_KEY` and optional `ENGINE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ENGINE_API_KEY")
            .map_err(|_| EngineError::Config("ENGINE_API_KEY not set".into()))?;
        let client = Self::new(api_key);
        Ok(match std::env::var("ENGINE_URL") {
            Ok(url) => client.with_base_url(url),
            Err(_) => client,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn crawl_site(&self, request: &CrawlSiteRequest) -> Result<CrawlSiteResponse> {
        self.post("/api/crawl/site", request, CRAWL_TIMEOUT).await
    }

    pub async fn search_platform(
        &self,
        request: &SearchPlatformRequest,
    ) -> Result<SearchPlatformResponse> {
        self.post("/api/search/platform", request, SEARCH_TIMEOUT).await
    }

    /// Extract entities for up to 50 items in a single call.
    pub async fn extract_entities(
        &self,
        request: &ExtractEntitiesRequest,
    ) -> Result<ExtractEntitiesResponse> {
        self.post("/api/extract/entities", request, EXTRACT_TIMEOUT).await
    }

    /// Embed up to 100 items in a single call.
    pub async fn embed_batch(&self, request: &EmbedBatchRequest) -> Result<EmbedBatchResponse> {
        self.post("/api/embed/batch", request, EMBED_BATCH_TIMEOUT).await
    }

    pub async fn cluster_topics(
        &self,
        request: &ClusterTopicsRequest,
    ) -> Result<ClusterTopicsResponse> {
        self.post("/api/analyze/topics", request, CLUSTER_TIMEOUT).await
    }

    pub async fn dimension_suggestions(
        &self,
        request: &SuggestionsRequest,
    ) -> Result<SuggestionsResponse> {
        self.post("/api/analyze/suggestions", request, SUGGESTIONS_TIMEOUT)
            .await
    }

    pub async fn generate_brief(&self, request: &BriefRequest) -> Result<BriefDraft> {
        self.post("/api/analyze/brief", request, BRIEF_TIMEOUT).await
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req, timeout: Duration) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let start = Instant::now();

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e, "Engine request failed");
                EngineError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = rejection_detail(&error_text);
            warn!(path, status = %status, detail = %detail, "Engine rejected request");
            return Err(EngineError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed = response
            .json::<Resp>()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))?;

        debug!(
            path,
            duration_ms = start.elapsed().as_millis() as u64,
            "Engine call completed"
        );

        Ok(parsed)
    }
}

/// Pull `detail` out of an engine error body, falling back to the raw text.
fn rejection_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.is_empty() => "no response body".to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = EngineClient::new("secret").with_base_url("http://engine:8000/");

        assert_eq!(client.api_key, "secret");
        assert_eq!(client.base_url(), "http://engine:8000");
    }

    #[test]
    fn test_rejection_detail_prefers_detail_field() {
        assert_eq!(
            rejection_detail(r#"{"detail":"Maximum 50 items per request"}"#),
            "Maximum 50 items per request"
        );
        assert_eq!(rejection_detail("Bad Gateway"), "Bad Gateway");
        assert_eq!(rejection_detail(""), "no response body");
    }

    #[test]
    fn test_rejection_detail_keeps_structured_detail() {
        let detail = rejection_detail(r#"{"detail":[{"loc":["body","url"],"msg":"field required"}]}"#);
        assert!(detail.contains("field required"));
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_retryable() {
        // Nothing listens on port 9 locally.
        let client = EngineClient::new("secret").with_base_url("http://127.0.0.1:9");
        let err = client
            .embed_batch(&EmbedBatchRequest { items: vec![] })
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Unreachable(_)));
        assert!(err.is_retryable());
    }
}
