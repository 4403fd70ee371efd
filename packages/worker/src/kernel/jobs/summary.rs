//! Typed job results.
//!
//! Handlers return a [`JobSummary`]; it becomes JSON only when written to the
//! record's `result_summary` column.

use serde::Serialize;
use serde_json::Value;

use crate::domains::analysis::{ClusterSummary, EmbedSummary, ExtractSummary, FullAnalysisSummary};
use crate::domains::briefs::BriefSummary;
use crate::domains::discovery::{CrawlSummary, SearchSummary};
use crate::domains::maintenance::PurgeSummary;
use crate::domains::schedules::AdvanceSummary;
use crate::domains::scoring::ScoreSummary;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JobSummary {
    Crawl(CrawlSummary),
    Search(SearchSummary),
    Extract(ExtractSummary),
    Embed(EmbedSummary),
    Cluster(ClusterSummary),
    Score(ScoreSummary),
    FullAnalysis(FullAnalysisSummary),
    Briefs(BriefSummary),
    Schedules(AdvanceSummary),
    Purge(PurgeSummary),
}

impl JobSummary {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

macro_rules! impl_from_summary {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for JobSummary {
                fn from(summary: $ty) -> Self {
                    JobSummary::$variant(summary)
                }
            }
        )*
    };
}

impl_from_summary! {
    Crawl => CrawlSummary,
    Search => SearchSummary,
    Extract => ExtractSummary,
    Embed => EmbedSummary,
    Cluster => ClusterSummary,
    Score => ScoreSummary,
    FullAnalysis => FullAnalysisSummary,
    Briefs => BriefSummary,
    Schedules => AdvanceSummary,
    Purge => PurgeSummary,
}
