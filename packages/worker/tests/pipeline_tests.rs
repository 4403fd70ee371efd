//! End-to-end runs of analysis jobs through the analysis channel worker.

mod common;

use chrono::{Duration, Utc};
use common::TestHarness;
use engine_client::{ExtractEntitiesResponse, ExtractedEntity, ItemEntities};
use worker_core::domains::content::{ContentItem, ContentStatus, Platform};
use worker_core::kernel::jobs::{JobChannel, JobFamily, JobPayload, JobStatus};
use worker_core::kernel::test_dependencies::{content_item, project, unreachable, MockEngine};
use uuid::Uuid;

fn approved_items(project_id: Uuid, count: usize) -> Vec<ContentItem> {
    (0..count)
        .map(|n| {
            let mut item = content_item(project_id, &format!("https://acme.test/post-{n}"));
            item.platform = if n % 2 == 0 { Platform::News } else { Platform::Website };
            item.raw_content = Some(format!("Body of post {n}"));
            item.word_count = Some(900);
            item.published_at = Some(Utc::now() - Duration::days(10 + n as i64));
            item
        })
        .collect()
}

fn entity(label: &str, entity_type: &str, salience: f64) -> ExtractedEntity {
    ExtractedEntity {
        label: label.into(),
        entity_type: entity_type.into(),
        salience,
        context: None,
    }
}

#[tokio::test]
async fn full_analysis_scores_project_and_notifies_owner() {
    let harness = TestHarness::new();
    let project = harness.test.seed_project();
    for item in approved_items(project.id, 10) {
        harness.test.store.insert_content_item(item);
    }

    let record_id = harness
        .enqueue_analysis(&project, "FULL_ANALYSIS", JobPayload::FullAnalysis)
        .await;
    let processed = harness.drain(JobChannel::Analysis).await;

    assert_eq!(processed, 1);

    let record = harness
        .test
        .store
        .job_record(JobFamily::Analysis, record_id)
        .unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert!(record.started_at.is_some());
    assert!(record.completed_at.is_some());

    let summary = record.result_summary.unwrap();
    assert_eq!(summary["extract"]["itemsSent"], 10);
    assert_eq!(summary["embed"]["embedded"], 10);
    assert_eq!(summary["cluster"]["topics"], 1);

    let score = harness
        .deps
        .store
        .get_project_score(project.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!score.is_stale);
    assert_eq!(score.content_count, 10);
    assert_eq!(summary["score"]["overall"], score.overall);

    let notifications = harness.test.store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, project.user_id);
    assert_eq!(notifications[0].notification_type, "ANALYSIS_COMPLETED");
    assert_eq!(
        notifications[0].message,
        format!("Content readiness score: {}/100", score.overall)
    );
    assert_eq!(
        notifications[0].link.as_deref(),
        Some(format!("/projects/{}/score", project.id).as_str())
    );

    let actions: Vec<_> = harness
        .test
        .store
        .audit_logs()
        .into_iter()
        .map(|a| a.action)
        .collect();
    assert_eq!(actions, vec!["job.completed".to_string()]);
}

#[tokio::test]
async fn unreachable_engine_gets_one_retry_on_a_new_record() {
    let harness = TestHarness::with_engine(
        MockEngine::new().with_extract(Err(unreachable("connection refused"))),
    );
    let project = harness.test.seed_project();
    for item in approved_items(project.id, 3) {
        harness.test.store.insert_content_item(item);
    }

    let first_id = harness
        .enqueue_analysis(&project, "EXTRACT_ENTITIES", JobPayload::ExtractEntities)
        .await;
    let processed = harness.drain(JobChannel::Analysis).await;

    assert_eq!(processed, 2);

    let records = harness.test.store.job_records(JobFamily::Analysis);
    assert_eq!(records.len(), 2);

    let first = records.iter().find(|r| r.id == first_id).unwrap();
    assert_eq!(first.status, JobStatus::Failed);
    assert!(first
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("EngineUnavailable: "));

    let retry = records.iter().find(|r| r.id != first_id).unwrap();
    assert_eq!(retry.retry_of, Some(first_id));
    assert_eq!(retry.status, JobStatus::Completed);
    assert_eq!(retry.job_type, "EXTRACT_ENTITIES");
}

#[tokio::test]
async fn retries_stop_after_the_second_attempt() {
    let harness = TestHarness::with_engine(
        MockEngine::new()
            .with_embed(Err(unreachable("timeout")))
            .with_embed(Err(unreachable("timeout"))),
    );
    let project = harness.test.seed_project();
    for item in approved_items(project.id, 2) {
        harness.test.store.insert_content_item(item);
    }

    harness
        .enqueue_analysis(&project, "GENERATE_EMBEDDINGS", JobPayload::GenerateEmbeddings)
        .await;
    let processed = harness.drain(JobChannel::Analysis).await;

    assert_eq!(processed, 2);
    let records = harness.test.store.job_records(JobFamily::Analysis);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == JobStatus::Failed));
    assert!(harness.test.queue.pending(JobChannel::Analysis).is_empty());
    assert!(harness.test.store.notifications().is_empty());
}

#[tokio::test]
async fn extraction_accumulates_entity_frequency_across_items() {
    let owner = project(Uuid::new_v4());
    let items = approved_items(owner.id, 2);
    let engine = MockEngine::new().with_extract(Ok(ExtractEntitiesResponse {
        results: items
            .iter()
            .map(|item| ItemEntities {
                id: item.id.to_string(),
                entities: vec![
                    entity("Rust", "CONCEPT", 0.9),
                    entity(" rust ", "CONCEPT", 0.4),
                ],
                error: None,
            })
            .collect(),
    }));

    let harness = TestHarness::with_engine(engine);
    harness.test.store.insert_project(owner.clone());
    for item in items.iter().cloned() {
        harness.test.store.insert_content_item(item);
    }

    harness
        .enqueue_analysis(&owner, "EXTRACT_ENTITIES", JobPayload::ExtractEntities)
        .await;
    harness.drain(JobChannel::Analysis).await;

    let entities = harness.test.store.entities(owner.id);
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].normalized_label, "rust");
    assert_eq!(entities[0].frequency, 4);

    // One link per item even though each item mentioned the entity twice
    let links = harness.test.store.content_entities();
    assert_eq!(links.len(), 2);
    assert!(items
        .iter()
        .all(|item| links.iter().filter(|l| l.content_id == item.id).count() == 1));
}

#[tokio::test]
async fn archived_content_is_left_out_of_scoring() {
    let harness = TestHarness::new();
    let project = harness.test.seed_project();
    let items = approved_items(project.id, 4);
    for item in items.iter().cloned() {
        harness.test.store.insert_content_item(item);
    }
    harness
        .test
        .store
        .set_content_status(items[0].id, ContentStatus::Archived);

    harness
        .enqueue_analysis(&project, "COMPUTE_SCORE", JobPayload::ComputeScore)
        .await;
    harness.drain(JobChannel::Analysis).await;

    let score = harness
        .deps
        .store
        .get_project_score(project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(score.content_count, 3);
}

#[tokio::test]
async fn briefs_are_not_duplicated_across_runs() {
    let harness = TestHarness::new();
    let project = harness.test.seed_project();
    for item in approved_items(project.id, 3) {
        harness.test.store.insert_content_item(item);
    }

    harness
        .enqueue_analysis(&project, "GENERATE_BRIEFS", JobPayload::GenerateBriefs)
        .await;
    harness.drain(JobChannel::Analysis).await;

    let first_run = harness.test.store.briefs(project.id);
    let drafted = harness.test.engine.brief_calls().len();
    assert!(!first_run.is_empty());
    assert_eq!(first_run.len(), drafted);

    harness
        .enqueue_analysis(&project, "GENERATE_BRIEFS", JobPayload::GenerateBriefs)
        .await;
    harness.drain(JobChannel::Analysis).await;

    assert_eq!(harness.test.store.briefs(project.id).len(), first_run.len());
    assert_eq!(harness.test.engine.brief_calls().len(), drafted);

    let records = harness.test.store.job_records(JobFamily::Analysis);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == JobStatus::Completed));

    let briefs_notices = harness
        .test
        .store
        .notifications()
        .into_iter()
        .filter(|n| n.notification_type == "BRIEFS_GENERATED")
        .count();
    assert_eq!(briefs_notices, 2);
}
