//! Crawl a project's site and upsert every page as a WEBSITE item.

use serde::Serialize;
use tracing::info;

use engine_client::CrawlSiteRequest;

use super::{parse_published_at, UpsertTally};
use crate::domains::content::{Platform, SourceType, UpsertContentItem};
use crate::kernel::jobs::{CrawlSiteConfig, JobEnvelope, JobError};
use crate::kernel::WorkerDeps;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    pub crawled: usize,
    pub created: usize,
    pub updated: usize,
    pub engine_errors: usize,
}

pub async fn crawl_site(
    job: &JobEnvelope<CrawlSiteConfig>,
    deps: &WorkerDeps,
) -> Result<CrawlSummary, JobError> {
    let config = &job.config;
    if config.url.trim().is_empty() {
        return Err(JobError::InvalidPayload("crawl config has no url".into()));
    }

    let request = CrawlSiteRequest {
        url: config.url.clone(),
        max_depth: config.max_depth,
        max_pages: config.max_pages,
        rate_limit: config.rate_limit,
    };
    let response = deps.engine.crawl_site(&request).await?;

    let mut tally = UpsertTally::default();
    for page in &response.pages {
        let title = page
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(page.url.as_str());

        let item = UpsertContentItem::builder()
            .project_id(job.project_id)
            .url(page.url.clone())
            .title(title)
            .platform(Platform::Website)
            .source_type(SourceType::Crawl)
            .raw_content(page.raw_content.clone())
            .excerpt(page.excerpt.clone().or_else(|| page.description.clone()))
            .word_count(page.word_count)
            .published_at(parse_published_at(page.published_at.as_deref()))
            .build();

        tally.record(deps.store.upsert_content_item(item).await?);
    }
    let tally = tally.finish(job.project_id, deps).await;

    info!(
        project_id = %job.project_id,
        url = %config.url,
        crawled = response.pages.len(),
        created = tally.created,
        updated = tally.updated,
        "site crawled"
    );

    Ok(CrawlSummary {
        crawled: response.pages.len(),
        created: tally.created,
        updated: tally.updated,
        engine_errors: (response.error_count as usize).max(response.errors.len()),
    })
}
