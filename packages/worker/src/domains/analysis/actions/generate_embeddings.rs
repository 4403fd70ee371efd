//! Embedding generation for items with text and no vector yet.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use engine_client::{EmbedBatchRequest, EmbedItem};

use crate::kernel::jobs::JobError;
use crate::kernel::WorkerDeps;

/// Items per engine request.
pub const EMBED_BATCH_SIZE: usize = 100;

/// Width of the `content_items.embedding` column.
pub const EMBEDDING_DIMENSIONS: usize = 384;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedSummary {
    pub candidates: usize,
    pub batches: usize,
    pub embedded: usize,
    pub failed: usize,
}

pub async fn generate_embeddings(project_id: Uuid, deps: &WorkerDeps) -> Result<EmbedSummary, JobError> {
    let items = deps.store.list_items_needing_embedding(project_id).await?;

    let mut summary = EmbedSummary {
        candidates: items.len(),
        ..Default::default()
    };
    if items.is_empty() {
        debug!(project_id = %project_id, "nothing to embed");
        return Ok(summary);
    }

    for batch in items.chunks(EMBED_BATCH_SIZE) {
        let ids: HashMap<String, Uuid> = batch.iter().map(|i| (i.id.to_string(), i.id)).collect();
        let request = EmbedBatchRequest {
            items: batch
                .iter()
                .map(|item| EmbedItem {
                    id: item.id.to_string(),
                    text: item.raw_content.clone().unwrap_or_default(),
                })
                .collect(),
        };

        let response = deps.engine.embed_batch(&request).await?;
        summary.batches += 1;

        let mut answered = 0;
        for result in response.results {
            let Some(content_id) = ids.get(&result.id).copied() else {
                continue;
            };
            answered += 1;

            if result.error.is_some() || result.embedding.len() != EMBEDDING_DIMENSIONS {
                warn!(
                    content_id = %content_id,
                    error = ?result.error,
                    dimensions = result.embedding.len(),
                    "no usable embedding for item"
                );
                summary.failed += 1;
                continue;
            }

            deps.store
                .set_content_embedding(content_id, result.embedding)
                .await?;
            summary.embedded += 1;
        }

        // Items the engine silently dropped
        summary.failed += batch.len().saturating_sub(answered);
    }

    info!(
        project_id = %project_id,
        embedded = summary.embedded,
        failed = summary.failed,
        batches = summary.batches,
        "embeddings generated"
    );
    Ok(summary)
}
