//! Discovery job handlers.

use crate::kernel::jobs::{CrawlSiteConfig, JobEnvelope, JobRegistry, JobType, SearchPlatformConfig};

use super::actions::{crawl_site, search_platforms};

pub fn register(registry: &mut JobRegistry) {
    registry.register::<JobEnvelope<CrawlSiteConfig>, _, _, _>(
        JobType::CrawlSite,
        |job, deps| async move { crawl_site(&job, &deps).await },
    );

    registry.register::<JobEnvelope<SearchPlatformConfig>, _, _, _>(
        JobType::SearchPlatform,
        |job, deps| async move { search_platforms(&job, &deps).await },
    );
}
