//! Entity extraction over approved content.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use engine_client::{ExtractEntitiesRequest, ExtractItem};

use crate::domains::content::EntityType;
use crate::kernel::jobs::JobError;
use crate::kernel::WorkerDeps;

/// Most items sent in one extraction run.
pub const EXTRACTION_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractSummary {
    pub items_sent: usize,
    pub items_processed: usize,
    pub entities_upserted: usize,
    pub item_errors: usize,
}

pub async fn extract_entities(project_id: Uuid, deps: &WorkerDeps) -> Result<ExtractSummary, JobError> {
    let items = deps
        .store
        .list_items_for_extraction(project_id, EXTRACTION_LIMIT)
        .await?;

    if items.is_empty() {
        debug!(project_id = %project_id, "no approved items with text to extract");
        return Ok(ExtractSummary::default());
    }

    let ids: HashMap<String, Uuid> = items.iter().map(|i| (i.id.to_string(), i.id)).collect();
    let request = ExtractEntitiesRequest {
        items: items
            .iter()
            .map(|item| ExtractItem {
                id: item.id.to_string(),
                title: item.title.clone(),
                text: item.raw_content.clone().unwrap_or_default(),
            })
            .collect(),
    };

    let response = deps.engine.extract_entities(&request).await?;

    let mut summary = ExtractSummary {
        items_sent: items.len(),
        ..Default::default()
    };

    for result in &response.results {
        let Some(content_id) = ids.get(&result.id).copied() else {
            warn!(project_id = %project_id, item = %result.id, "extraction result for unknown item");
            summary.item_errors += 1;
            continue;
        };

        if let Some(error) = &result.error {
            warn!(content_id = %content_id, error = %error, "entity extraction failed for item");
            summary.item_errors += 1;
            continue;
        }

        for extracted in &result.entities {
            if extracted.label.trim().is_empty() {
                continue;
            }
            let entity = deps
                .store
                .upsert_entity(project_id, &extracted.label, EntityType::parse(&extracted.entity_type))
                .await?;
            deps.store
                .upsert_content_entity(
                    content_id,
                    entity.id,
                    extracted.salience,
                    extracted.context.as_deref(),
                )
                .await?;
            summary.entities_upserted += 1;
        }
        summary.items_processed += 1;
    }

    info!(
        project_id = %project_id,
        items = summary.items_sent,
        entities = summary.entities_upserted,
        errors = summary.item_errors,
        "entities extracted"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::content::ContentStatus;
    use crate::kernel::test_dependencies::{content_item, MockEngine, TestDependencies};
    use engine_client::{ExtractEntitiesResponse, ExtractedEntity, ItemEntities};

    fn entity(label: &str, entity_type: &str) -> ExtractedEntity {
        ExtractedEntity {
            label: label.into(),
            entity_type: entity_type.into(),
            salience: 0.8,
            context: Some(format!("...{label}...")),
        }
    }

    #[tokio::test]
    async fn test_repeated_extraction_increments_without_duplicating() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        let mut item = content_item(project.id, "https://acme.test/a");
        item.raw_content = Some("Acme and Jane Doe".into());
        test.store.insert_content_item(item.clone());

        let reply = || {
            Ok(ExtractEntitiesResponse {
                results: vec![ItemEntities {
                    id: item.id.to_string(),
                    entities: vec![entity("Acme", "BRAND"), entity("Jane  Doe", "PERSON")],
                    error: None,
                }],
            })
        };
        let engine = MockEngine::new().with_extract(reply()).with_extract(reply());
        let test = test.with_engine(engine);
        let deps = test.into_deps();

        extract_entities(project.id, &deps).await.unwrap();
        let summary = extract_entities(project.id, &deps).await.unwrap();

        assert_eq!(summary.items_processed, 1);
        assert_eq!(summary.entities_upserted, 2);

        let entities = test.store.entities(project.id);
        assert_eq!(entities.len(), 2);
        assert!(entities.iter().all(|e| e.frequency == 2));
        let jane = entities.iter().find(|e| e.entity_type == EntityType::Person).unwrap();
        assert_eq!(jane.normalized_label, "jane doe");

        // One association per (content, entity) pair
        assert_eq!(test.store.content_entities().len(), 2);
    }

    #[tokio::test]
    async fn test_only_approved_items_with_text_are_sent() {
        let test = TestDependencies::new();
        let project = test.seed_project();

        let mut approved = content_item(project.id, "https://acme.test/approved");
        approved.raw_content = Some("text".into());
        let mut discovered = approved.clone();
        discovered.id = Uuid::new_v4();
        discovered.url = "https://acme.test/discovered".into();
        discovered.status = ContentStatus::Discovered;
        let empty = content_item(project.id, "https://acme.test/empty");
        for item in [approved, discovered, empty] {
            test.store.insert_content_item(item);
        }

        let summary = extract_entities(project.id, &test.into_deps()).await.unwrap();

        assert_eq!(summary.items_sent, 1);
    }

    #[tokio::test]
    async fn test_item_errors_are_counted() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        let mut item = content_item(project.id, "https://acme.test/a");
        item.raw_content = Some("text".into());
        test.store.insert_content_item(item.clone());

        let engine = MockEngine::new().with_extract(Ok(ExtractEntitiesResponse {
            results: vec![ItemEntities {
                id: item.id.to_string(),
                entities: vec![],
                error: Some("model overloaded".into()),
            }],
        }));
        let test = test.with_engine(engine);

        let summary = extract_entities(project.id, &test.into_deps()).await.unwrap();

        assert_eq!(summary.item_errors, 1);
        assert_eq!(summary.items_processed, 0);
    }

    #[tokio::test]
    async fn test_nothing_to_extract_skips_engine() {
        let test = TestDependencies::new();
        let project = test.seed_project();

        let summary = extract_entities(project.id, &test.into_deps()).await.unwrap();

        assert_eq!(summary, ExtractSummary::default());
        assert!(test.engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_new_salience_overwrites_existing_link() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        let mut item = content_item(project.id, "https://acme.test/a");
        item.raw_content = Some("Acme".into());
        test.store.insert_content_item(item.clone());

        let reply = |salience: f64| {
            Ok(ExtractEntitiesResponse {
                results: vec![ItemEntities {
                    id: item.id.to_string(),
                    entities: vec![ExtractedEntity {
                        salience,
                        ..entity("Acme", "BRAND")
                    }],
                    error: None,
                }],
            })
        };
        let engine = MockEngine::new().with_extract(reply(0.2)).with_extract(reply(0.9));
        let test = test.with_engine(engine);
        let deps = test.into_deps();

        extract_entities(project.id, &deps).await.unwrap();
        assert_eq!(test.store.content_entities()[0].salience, 0.2);
        extract_entities(project.id, &deps).await.unwrap();

        let links = test.store.content_entities();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].content_id, item.id);
        assert_eq!(links[0].salience, 0.9);
    }
}
