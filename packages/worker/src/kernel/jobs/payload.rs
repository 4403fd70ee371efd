//! Dispatch payloads.
//!
//! Every queued message carries a [`JobPayload`], a union tagged by
//! `jobType`. Job variants wrap a [`JobEnvelope`] pointing at their job
//! record; maintenance variants carry nothing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::job::JobFamily;

// ============================================================================
// Job types and channels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    CrawlSite,
    SearchPlatform,
    ExtractEntities,
    GenerateEmbeddings,
    ClusterTopics,
    ComputeScore,
    FullAnalysis,
    GenerateBriefs,
    AdvanceSchedules,
    PurgeAuditLogs,
}

impl JobType {
    pub const ALL: [JobType; 10] = [
        JobType::CrawlSite,
        JobType::SearchPlatform,
        JobType::ExtractEntities,
        JobType::GenerateEmbeddings,
        JobType::ClusterTopics,
        JobType::ComputeScore,
        JobType::FullAnalysis,
        JobType::GenerateBriefs,
        JobType::AdvanceSchedules,
        JobType::PurgeAuditLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::CrawlSite => "CRAWL_SITE",
            JobType::SearchPlatform => "SEARCH_PLATFORM",
            JobType::ExtractEntities => "EXTRACT_ENTITIES",
            JobType::GenerateEmbeddings => "GENERATE_EMBEDDINGS",
            JobType::ClusterTopics => "CLUSTER_TOPICS",
            JobType::ComputeScore => "COMPUTE_SCORE",
            JobType::FullAnalysis => "FULL_ANALYSIS",
            JobType::GenerateBriefs => "GENERATE_BRIEFS",
            JobType::AdvanceSchedules => "ADVANCE_SCHEDULES",
            JobType::PurgeAuditLogs => "PURGE_AUDIT_LOGS",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    pub fn channel(&self) -> JobChannel {
        match self.family() {
            Some(JobFamily::Discovery) => JobChannel::Discovery,
            Some(JobFamily::Analysis) => JobChannel::Analysis,
            None => JobChannel::Maintenance,
        }
    }

    /// Which record table this job type reports into. `None` for maintenance.
    pub fn family(&self) -> Option<JobFamily> {
        match self {
            JobType::CrawlSite | JobType::SearchPlatform => Some(JobFamily::Discovery),
            JobType::ExtractEntities
            | JobType::GenerateEmbeddings
            | JobType::ClusterTopics
            | JobType::ComputeScore
            | JobType::FullAnalysis
            | JobType::GenerateBriefs => Some(JobFamily::Analysis),
            JobType::AdvanceSchedules | JobType::PurgeAuditLogs => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobChannel {
    Discovery,
    Analysis,
    Maintenance,
}

impl JobChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobChannel::Discovery => "discovery",
            JobChannel::Analysis => "analysis",
            JobChannel::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for JobChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Configs
// ============================================================================

fn default_max_depth() -> u32 {
    2
}

fn default_max_pages() -> u32 {
    50
}

fn default_rate_limit() -> f64 {
    1.0
}

fn default_max_results() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSiteConfig {
    pub url: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,
}

impl Default for CrawlSiteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            rate_limit: default_rate_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPlatformConfig {
    pub brand: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results_per_platform: u32,
}

impl Default for SearchPlatformConfig {
    fn default() -> Self {
        Self {
            brand: String::new(),
            domain: None,
            platforms: Vec::new(),
            max_results_per_platform: default_max_results(),
        }
    }
}

/// Analysis jobs take no options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {}

// ============================================================================
// Payloads
// ============================================================================

/// Common body of every record-backed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEnvelope<C> {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub job_record_id: Uuid,
    #[serde(default)]
    pub config: C,
}

impl<C> JobEnvelope<C> {
    pub fn new(project_id: Uuid, user_id: Uuid, job_record_id: Uuid, config: C) -> Self {
        Self {
            project_id,
            user_id,
            job_record_id,
            config,
        }
    }
}

/// Body of a maintenance trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceTrigger {}

/// The record a payload reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef {
    pub family: JobFamily,
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "jobType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPayload {
    CrawlSite(JobEnvelope<CrawlSiteConfig>),
    SearchPlatform(JobEnvelope<SearchPlatformConfig>),
    ExtractEntities(JobEnvelope<AnalysisConfig>),
    GenerateEmbeddings(JobEnvelope<AnalysisConfig>),
    ClusterTopics(JobEnvelope<AnalysisConfig>),
    ComputeScore(JobEnvelope<AnalysisConfig>),
    FullAnalysis(JobEnvelope<AnalysisConfig>),
    GenerateBriefs(JobEnvelope<AnalysisConfig>),
    AdvanceSchedules,
    PurgeAuditLogs,
}

impl JobPayload {
    /// Build a payload from its parts, e.g. a schedule row's job type and
    /// stored config.
    pub fn from_parts(
        job_type: JobType,
        project_id: Uuid,
        user_id: Uuid,
        job_record_id: Uuid,
        config: Value,
    ) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "jobType": job_type.as_str(),
            "projectId": project_id,
            "userId": user_id,
            "jobRecordId": job_record_id,
            "config": config,
        }))
    }

    pub fn job_type(&self) -> JobType {
        match self {
            JobPayload::CrawlSite(_) => JobType::CrawlSite,
            JobPayload::SearchPlatform(_) => JobType::SearchPlatform,
            JobPayload::ExtractEntities(_) => JobType::ExtractEntities,
            JobPayload::GenerateEmbeddings(_) => JobType::GenerateEmbeddings,
            JobPayload::ClusterTopics(_) => JobType::ClusterTopics,
            JobPayload::ComputeScore(_) => JobType::ComputeScore,
            JobPayload::FullAnalysis(_) => JobType::FullAnalysis,
            JobPayload::GenerateBriefs(_) => JobType::GenerateBriefs,
            JobPayload::AdvanceSchedules => JobType::AdvanceSchedules,
            JobPayload::PurgeAuditLogs => JobType::PurgeAuditLogs,
        }
    }

    pub fn channel(&self) -> JobChannel {
        self.job_type().channel()
    }

    pub fn record(&self) -> Option<RecordRef> {
        let family = self.job_type().family()?;
        let (id, project_id, user_id) = match self {
            JobPayload::CrawlSite(e) => (e.job_record_id, e.project_id, e.user_id),
            JobPayload::SearchPlatform(e) => (e.job_record_id, e.project_id, e.user_id),
            JobPayload::ExtractEntities(e)
            | JobPayload::GenerateEmbeddings(e)
            | JobPayload::ClusterTopics(e)
            | JobPayload::ComputeScore(e)
            | JobPayload::FullAnalysis(e)
            | JobPayload::GenerateBriefs(e) => (e.job_record_id, e.project_id, e.user_id),
            JobPayload::AdvanceSchedules | JobPayload::PurgeAuditLogs => return None,
        };
        Some(RecordRef {
            family,
            id,
            project_id,
            user_id,
        })
    }

    /// Same job pointed at a different record (used for retries).
    pub fn with_job_record_id(mut self, record_id: Uuid) -> Self {
        match &mut self {
            JobPayload::CrawlSite(e) => e.job_record_id = record_id,
            JobPayload::SearchPlatform(e) => e.job_record_id = record_id,
            JobPayload::ExtractEntities(e)
            | JobPayload::GenerateEmbeddings(e)
            | JobPayload::ClusterTopics(e)
            | JobPayload::ComputeScore(e)
            | JobPayload::FullAnalysis(e)
            | JobPayload::GenerateBriefs(e) => e.job_record_id = record_id,
            JobPayload::AdvanceSchedules | JobPayload::PurgeAuditLogs => {}
        }
        self
    }
}
