mod crawl_site;
mod search_platforms;

pub use crawl_site::{crawl_site, CrawlSummary};
pub use search_platforms::{search_platforms, SearchSummary};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::kernel::{UpsertOutcome, WorkerDeps};

/// Engine dates arrive as `YYYY-MM-DD` or RFC 3339.
pub(crate) fn parse_published_at(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Created/updated tally for a discovery run.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct UpsertTally {
    pub created: usize,
    pub updated: usize,
}

impl UpsertTally {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }

    /// New content invalidates the current score.
    pub async fn finish(self, project_id: Uuid, deps: &WorkerDeps) -> Self {
        if self.created > 0 {
            if let Err(e) = deps.store.mark_score_stale(project_id).await {
                warn!(project_id = %project_id, error = %e, "failed to mark score stale");
            }
        }
        self
    }
}
