//! Improvement suggestions for weak dimensions.

use engine_client::{SuggestionsRequest, WeakDimension};
use tracing::warn;

use crate::domains::projects::Project;
use crate::domains::scoring::dimensions::Dimensions;
use crate::kernel::WorkerDeps;

pub const MAX_SUGGESTIONS: usize = 5;

const ALL_GOOD: &str =
    "Your content is in great shape across every dimension. Keep publishing consistently.";

fn static_suggestion(dimension: &str) -> &'static str {
    match dimension {
        "coverage" => "Expand beyond your own site: publish on LinkedIn, Medium, Substack, YouTube, Reddit and news outlets.",
        "depth" => "Go deeper: longer, more detailed pieces build topical authority.",
        "freshness" => "Publish new content regularly. Most of your dated content is getting old.",
        "authority" => "Aim for placements on high-authority platforms such as news sites and LinkedIn.",
        "coherence" => "Focus your content on a few core topics so your key entities show up consistently.",
        _ => "Strengthen this dimension with more targeted content.",
    }
}

/// Suggestions for the weak dimensions, weakest first.
///
/// The engine is asked first; when it fails or answers with nothing, each
/// weak dimension gets a canned sentence. Never fails.
pub async fn generate_suggestions(project: &Project, dims: &Dimensions, deps: &WorkerDeps) -> Vec<String> {
    let weak = dims.weak();
    if weak.is_empty() {
        return vec![ALL_GOOD.to_string()];
    }

    let request = SuggestionsRequest {
        project_name: project.name.clone(),
        dimensions: dims.to_map(),
        weak_dimensions: weak
            .iter()
            .map(|(name, value)| WeakDimension {
                name: name.to_string(),
                value: *value,
            })
            .collect(),
    };

    match deps.engine.dimension_suggestions(&request).await {
        Ok(response) => {
            let suggestions: Vec<String> = response
                .suggestions
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .take(MAX_SUGGESTIONS)
                .collect();
            if !suggestions.is_empty() {
                return suggestions;
            }
        }
        Err(e) => warn!(project_id = %project.id, error = %e, "suggestion request failed"),
    }

    weak.iter()
        .take(MAX_SUGGESTIONS)
        .map(|(name, _)| static_suggestion(name).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{project, unreachable, EngineCall, MockEngine, TestDependencies};
    use engine_client::SuggestionsResponse;
    use uuid::Uuid;

    fn weak_dims() -> Dimensions {
        Dimensions {
            coverage: 30.0,
            depth: 80.0,
            freshness: 10.0,
            authority: 70.0,
            coherence: 55.0,
        }
    }

    #[tokio::test]
    async fn test_engine_suggestions_win() {
        let engine = MockEngine::new().with_suggestions(Ok(SuggestionsResponse {
            suggestions: vec!["Post weekly".into(), "  ".into()],
        }));
        let test = TestDependencies::new().with_engine(engine);

        let suggestions = generate_suggestions(&project(Uuid::new_v4()), &weak_dims(), &test.into_deps()).await;

        assert_eq!(suggestions, vec!["Post weekly".to_string()]);
        assert_eq!(
            test.engine.calls(),
            vec![EngineCall::Suggestions {
                weak: vec!["freshness".into(), "coverage".into(), "coherence".into()]
            }]
        );
    }

    #[tokio::test]
    async fn test_engine_failure_falls_back_to_static_sentences() {
        let engine = MockEngine::new().with_suggestions(Err(unreachable("down")));
        let test = TestDependencies::new().with_engine(engine);

        let suggestions = generate_suggestions(&project(Uuid::new_v4()), &weak_dims(), &test.into_deps()).await;

        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0], static_suggestion("freshness"));
    }

    #[tokio::test]
    async fn test_empty_engine_answer_falls_back() {
        let test = TestDependencies::new();

        let suggestions = generate_suggestions(&project(Uuid::new_v4()), &weak_dims(), &test.into_deps()).await;

        assert_eq!(suggestions.len(), 3);
    }

    #[tokio::test]
    async fn test_no_weak_dimension_gives_one_positive_message() {
        let test = TestDependencies::new();
        let strong = Dimensions {
            coverage: 90.0,
            depth: 90.0,
            freshness: 90.0,
            authority: 90.0,
            coherence: 90.0,
        };

        let suggestions = generate_suggestions(&project(Uuid::new_v4()), &strong, &test.into_deps()).await;

        assert_eq!(suggestions, vec![ALL_GOOD.to_string()]);
        assert!(test.engine.calls().is_empty());
    }
}
