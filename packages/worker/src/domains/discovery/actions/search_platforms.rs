//! Search platforms for brand mentions and upsert each hit.

use serde::Serialize;
use tracing::info;

use engine_client::SearchPlatformRequest;

use super::UpsertTally;
use crate::domains::content::{Platform, SourceType, UpsertContentItem};
use crate::kernel::jobs::{JobEnvelope, JobError, SearchPlatformConfig};
use crate::kernel::WorkerDeps;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub found: usize,
    pub created: usize,
    pub updated: usize,
    pub engine_errors: usize,
}

pub async fn search_platforms(
    job: &JobEnvelope<SearchPlatformConfig>,
    deps: &WorkerDeps,
) -> Result<SearchSummary, JobError> {
    let config = &job.config;
    if config.brand.trim().is_empty() {
        return Err(JobError::InvalidPayload("search config has no brand".into()));
    }

    // No explicit platforms: search the key ones
    let platforms = if config.platforms.is_empty() {
        Platform::KEY_PLATFORMS
            .iter()
            .map(|p| p.as_str().to_string())
            .collect()
    } else {
        config.platforms.clone()
    };

    let request = SearchPlatformRequest {
        brand: config.brand.clone(),
        domain: config.domain.clone(),
        platforms,
        max_results_per_platform: config.max_results_per_platform,
    };
    let response = deps.engine.search_platform(&request).await?;

    let mut tally = UpsertTally::default();
    for hit in &response.results {
        let item = UpsertContentItem::builder()
            .project_id(job.project_id)
            .url(hit.url.clone())
            .title(hit.title.clone())
            .platform(Platform::parse(&hit.platform))
            .source_type(SourceType::Search)
            .excerpt(hit.snippet.clone())
            .build();

        tally.record(deps.store.upsert_content_item(item).await?);
    }
    let tally = tally.finish(job.project_id, deps).await;

    info!(
        project_id = %job.project_id,
        brand = %config.brand,
        found = response.results.len(),
        created = tally.created,
        "platform search finished"
    );

    Ok(SearchSummary {
        found: response.results.len(),
        created: tally.created,
        updated: tally.updated,
        engine_errors: response.errors.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{EngineCall, MockEngine, TestDependencies};
    use engine_client::{SearchHit, SearchPlatformResponse};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn hit(url: &str, platform: &str) -> SearchHit {
        SearchHit {
            url: url.into(),
            title: format!("Acme on {platform}"),
            snippet: Some("Acme launches".into()),
            platform: platform.into(),
        }
    }

    #[tokio::test]
    async fn test_hits_keep_their_platform() {
        let engine = MockEngine::new().with_search(Ok(SearchPlatformResponse {
            results: vec![
                hit("https://medium.com/@acme/launch", "MEDIUM"),
                hit("https://reddit.com/r/rockets/acme", "REDDIT"),
            ],
            total_found: 2,
            errors: vec![BTreeMap::from([
                ("platform".to_string(), "NEWS".to_string()),
                ("error".to_string(), "rate limited".to_string()),
            ])],
        }));
        let test = TestDependencies::new().with_engine(engine);
        let project = test.seed_project();
        let job = JobEnvelope::new(
            project.id,
            project.user_id,
            Uuid::new_v4(),
            SearchPlatformConfig {
                brand: "Acme".into(),
                ..Default::default()
            },
        );

        let summary = search_platforms(&job, &test.into_deps()).await.unwrap();

        assert_eq!(summary.found, 2);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.engine_errors, 1);

        let mut platforms: Vec<Platform> = test
            .store
            .content_items(project.id)
            .iter()
            .map(|i| i.platform)
            .collect();
        platforms.sort();
        assert_eq!(platforms, vec![Platform::Medium, Platform::Reddit]);

        // Empty platform list falls back to the key platforms
        match &test.engine.calls()[0] {
            EngineCall::Search { platforms, .. } => assert_eq!(platforms.len(), 6),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_brand_is_invalid() {
        let test = TestDependencies::new();
        let job = JobEnvelope::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            SearchPlatformConfig::default(),
        );

        let err = search_platforms(&job, &test.into_deps()).await.unwrap_err();

        assert_eq!(err.error_class(), "InvalidJob");
        assert!(test.engine.calls().is_empty());
    }
}
