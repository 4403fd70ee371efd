//! Discovery domain - finds content for a project.
//!
//! - `actions/` - crawl a site, search platforms for brand mentions
//! - `jobs` - `CRAWL_SITE` and `SEARCH_PLATFORM` handlers

pub mod actions;
pub mod jobs;

pub use actions::{crawl_site, search_platforms, CrawlSummary, SearchSummary};
