//! Brief generation: one engine draft per open gap.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use engine_client::BriefRequest;

use crate::domains::briefs::gaps::{detect_gaps, Gap};
use crate::domains::briefs::{BriefStatus, UpsertContentBrief};
use crate::domains::content::{ContentItem, ContentStatus};
use crate::domains::projects::Project;
use crate::domains::scoring::dimensions::{self, top_entities};
use crate::kernel::jobs::JobError;
use crate::kernel::WorkerDeps;

/// Gap drafts requested at once.
pub const BRIEF_CONCURRENCY: usize = 3;

const CONTEXT_ENTITIES: usize = 10;
const CONTEXT_TITLES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefSummary {
    pub gaps_found: usize,
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum GapOutcome {
    Generated,
    Skipped,
    Failed,
}

/// Project context shared by every draft request.
struct DraftContext {
    top_entities: Vec<String>,
    recent_titles: Vec<String>,
}

pub async fn generate_briefs(project_id: Uuid, deps: &WorkerDeps) -> Result<BriefSummary, JobError> {
    let project = deps.store.get_project(project_id).await?;
    let items = deps.store.list_content_items(project_id).await?;
    let entities = deps.store.list_entities(project_id).await?;
    let content_entities = deps.store.list_content_entities(project_id).await?;

    let dims = dimensions::compute(&items, &entities, &content_entities, Utc::now());
    let gaps = detect_gaps(&items, &entities, &content_entities, dims.freshness);

    let context = DraftContext {
        top_entities: top_entities(&entities, CONTEXT_ENTITIES)
            .into_iter()
            .map(|e| e.label.clone())
            .collect(),
        recent_titles: recent_titles(&items),
    };

    let outcomes: Vec<GapOutcome> = stream::iter(gaps.iter().cloned())
        .map(|gap| close_gap(&project, gap, &context, deps))
        .buffer_unordered(BRIEF_CONCURRENCY)
        .collect()
        .await;

    let mut summary = BriefSummary {
        gaps_found: gaps.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            GapOutcome::Generated => summary.generated += 1,
            GapOutcome::Skipped => summary.skipped += 1,
            GapOutcome::Failed => summary.failed += 1,
        }
    }

    info!(
        project_id = %project_id,
        gaps = summary.gaps_found,
        generated = summary.generated,
        skipped = summary.skipped,
        failed = summary.failed,
        "briefs generated"
    );
    Ok(summary)
}

fn recent_titles(items: &[ContentItem]) -> Vec<String> {
    let mut approved: Vec<&ContentItem> = items
        .iter()
        .filter(|i| i.status == ContentStatus::Approved)
        .collect();
    approved.sort_by_key(|i| std::cmp::Reverse(i.published_at.unwrap_or(i.created_at)));
    approved
        .into_iter()
        .take(CONTEXT_TITLES)
        .map(|i| i.title.clone())
        .collect()
}

async fn close_gap(project: &Project, gap: Gap, context: &DraftContext, deps: &WorkerDeps) -> GapOutcome {
    let store = &deps.store;

    match store.find_brief(project.id, gap.gap_type, &gap.gap_label).await {
        Ok(Some(existing)) if existing.status != BriefStatus::Rejected => {
            debug!(project_id = %project.id, gap = %gap.gap_label, "brief already exists");
            return GapOutcome::Skipped;
        }
        Ok(_) => {}
        Err(e) => {
            warn!(project_id = %project.id, gap = %gap.gap_label, error = %e, "failed to look up brief");
            return GapOutcome::Failed;
        }
    }

    let request = BriefRequest {
        project_name: project.name.clone(),
        gap_type: gap.gap_type.as_str().to_string(),
        gap_label: gap.gap_label.clone(),
        platform: gap.platform.map(|p| p.as_str().to_string()),
        severity: gap.severity.as_str().to_string(),
        top_entities: context.top_entities.clone(),
        recent_titles: context.recent_titles.clone(),
    };

    let draft = match deps.engine.generate_brief(&request).await {
        Ok(draft) => draft,
        Err(e) => {
            warn!(
                project_id = %project.id,
                gap_type = gap.gap_type.as_str(),
                gap = %gap.gap_label,
                error = %e,
                "brief generation failed"
            );
            return GapOutcome::Failed;
        }
    };

    let title = if draft.title.trim().is_empty() {
        format!("{}: {}", gap.gap_type.as_str(), gap.gap_label)
    } else {
        draft.title
    };

    let brief = UpsertContentBrief::builder()
        .project_id(project.id)
        .gap_type(gap.gap_type)
        .gap_label(gap.gap_label.clone())
        .platform(gap.platform)
        .severity(gap.severity)
        .title(title)
        .key_points(draft.key_points)
        .entities(draft.entities)
        .target_length(draft.target_length)
        .notes(draft.notes)
        .build();

    match store.upsert_brief(brief).await {
        Ok(_) => GapOutcome::Generated,
        Err(e) => {
            warn!(project_id = %project.id, gap = %gap.gap_label, error = %e, "failed to store brief");
            GapOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::briefs::GapType;
    use crate::domains::content::Platform;
    use crate::kernel::test_dependencies::{content_item, unreachable, MockEngine, TestDependencies};

    /// Content on every key platform except Reddit, all fresh.
    fn seed_all_but_reddit(test: &TestDependencies, project_id: Uuid) {
        for platform in Platform::KEY_PLATFORMS.into_iter().filter(|p| *p != Platform::Reddit) {
            for n in 0..3 {
                let mut item = content_item(project_id, &format!("https://{platform}.test/{n}"));
                item.platform = platform;
                item.published_at = Some(Utc::now());
                test.store.insert_content_item(item);
            }
        }
    }

    #[tokio::test]
    async fn test_one_brief_per_gap() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        seed_all_but_reddit(&test, project.id);

        let summary = generate_briefs(project.id, &test.into_deps()).await.unwrap();

        assert_eq!(
            summary,
            BriefSummary {
                gaps_found: 1,
                generated: 1,
                skipped: 0,
                failed: 0,
            }
        );
        let briefs = test.store.briefs(project.id);
        assert_eq!(briefs.len(), 1);
        assert_eq!(briefs[0].gap_type, GapType::Platform);
        assert_eq!(briefs[0].gap_label, "REDDIT");
        assert_eq!(briefs[0].platform, Some(Platform::Reddit));
        assert_eq!(briefs[0].title, "Brief: REDDIT");
        assert_eq!(briefs[0].status, BriefStatus::Pending);
    }

    #[tokio::test]
    async fn test_existing_briefs_are_skipped_unless_rejected() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        seed_all_but_reddit(&test, project.id);
        let deps = test.into_deps();

        generate_briefs(project.id, &deps).await.unwrap();
        let again = generate_briefs(project.id, &deps).await.unwrap();
        assert_eq!(again.skipped, 1);
        assert_eq!(again.generated, 0);
        assert_eq!(test.engine.brief_calls().len(), 1);

        let brief = test.store.briefs(project.id).remove(0);
        test.store.set_brief_status(brief.id, BriefStatus::Rejected);

        let regenerated = generate_briefs(project.id, &deps).await.unwrap();
        assert_eq!(regenerated.generated, 1);
        let briefs = test.store.briefs(project.id);
        assert_eq!(briefs.len(), 1);
        assert_eq!(briefs[0].status, BriefStatus::Pending);
    }

    #[tokio::test]
    async fn test_engine_failures_are_isolated() {
        let test = TestDependencies::new();
        let project = test.seed_project();
        // No content at all: six platform gaps plus stale content
        let engine = MockEngine::new()
            .with_brief(Err(unreachable("down")))
            .with_brief(Err(unreachable("down")));
        let test = test.with_engine(engine);

        let summary = generate_briefs(project.id, &test.into_deps()).await.unwrap();

        assert_eq!(summary.gaps_found, 7);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.generated, 5);
        assert_eq!(test.store.briefs(project.id).len(), 5);
    }

    #[test]
    fn test_recent_titles_prefer_newest_approved() {
        let project_id = Uuid::new_v4();
        let mut old = content_item(project_id, "https://acme.test/old");
        old.title = "Old".into();
        old.published_at = Some(Utc::now() - chrono::Duration::days(400));
        let mut new = content_item(project_id, "https://acme.test/new");
        new.title = "New".into();
        new.published_at = Some(Utc::now());
        let mut hidden = content_item(project_id, "https://acme.test/hidden");
        hidden.status = ContentStatus::Discovered;

        assert_eq!(recent_titles(&[old, new, hidden]), vec!["New", "Old"]);
    }
}
