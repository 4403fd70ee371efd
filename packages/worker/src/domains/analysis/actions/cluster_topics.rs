//! Topic clustering. Replaces every TOPIC entity of the project.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use engine_client::{ClusterItem, ClusterTopicsRequest};

use crate::domains::content::EntityType;
use crate::kernel::jobs::JobError;
use crate::kernel::WorkerDeps;

/// Fewer embedded items than this and clustering is skipped.
pub const MIN_ITEMS_FOR_CLUSTERING: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub items: usize,
    pub clusters_found: usize,
    pub topics: usize,
    pub assigned: usize,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClusterSummary {
    pub fn skipped(items: usize, reason: impl Into<String>) -> Self {
        Self {
            items,
            skipped: true,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Result recorded when clustering blew up inside the pipeline.
    pub fn failed(error: &JobError) -> Self {
        Self {
            skipped: true,
            error: Some(error.record_message()),
            ..Default::default()
        }
    }
}

pub async fn cluster_topics(project_id: Uuid, deps: &WorkerDeps) -> Result<ClusterSummary, JobError> {
    let items = deps.store.list_embedded_items(project_id).await?;

    if items.len() < MIN_ITEMS_FOR_CLUSTERING {
        info!(
            project_id = %project_id,
            items = items.len(),
            "not enough embedded items to cluster"
        );
        return Ok(ClusterSummary::skipped(
            items.len(),
            format!("need at least {MIN_ITEMS_FOR_CLUSTERING} embedded items"),
        ));
    }

    let request = ClusterTopicsRequest {
        items: items
            .iter()
            .map(|item| ClusterItem {
                id: item.id.to_string(),
                title: item.title.clone(),
                embedding: item.embedding.clone(),
            })
            .collect(),
    };
    let response = deps.engine.cluster_topics(&request).await?;

    // Only items we sent can be linked; checked before topics are dropped
    let sent: HashSet<Uuid> = items.iter().map(|item| item.id).collect();
    let assignments: Vec<_> = response
        .assignments
        .iter()
        .filter_map(|assignment| match Uuid::parse_str(&assignment.id) {
            Ok(content_id) if sent.contains(&content_id) => Some((content_id, assignment)),
            _ => {
                warn!(item = %assignment.id, "cluster assignment for unknown item");
                None
            }
        })
        .collect();

    // The engine's "not enough data" answer leaves existing topics alone
    if assignments.is_empty() {
        let reason = response
            .error
            .unwrap_or_else(|| "no clusters found".to_string());
        warn!(project_id = %project_id, reason = %reason, "clustering produced no assignments");
        return Ok(ClusterSummary::skipped(items.len(), reason));
    }

    deps.store.delete_topic_entities(project_id).await?;

    let mut summary = ClusterSummary {
        items: items.len(),
        clusters_found: response.clusters_found as usize,
        ..Default::default()
    };
    let mut topics = HashSet::new();

    for (content_id, assignment) in assignments {
        if assignment.topic_label.trim().is_empty() {
            continue;
        }

        let topic = deps
            .store
            .upsert_entity(project_id, &assignment.topic_label, EntityType::Topic)
            .await?;
        deps.store
            .upsert_content_entity(content_id, topic.id, assignment.confidence, None)
            .await?;

        topics.insert(topic.id);
        summary.assigned += 1;
    }
    summary.topics = topics.len();

    info!(
        project_id = %project_id,
        topics = summary.topics,
        assigned = summary.assigned,
        "topics clustered"
    );
    Ok(summary)
}
