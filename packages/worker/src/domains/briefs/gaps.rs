//! Gap detection.
//!
//! Pure function of a project's content, entities and freshness score. The
//! severity cut-offs are the score suggestion thresholds.

use std::collections::HashMap;

use serde::Serialize;

use crate::domains::briefs::{GapType, Severity};
use crate::domains::content::{ContentEntity, ContentItem, ContentStatus, Entity, EntityType, Platform};
use crate::domains::scoring::dimensions::{
    entity_coverage, top_entities, COHERENCE_TARGET, CRITICAL_THRESHOLD, SUGGESTION_THRESHOLD,
};

/// Fewer items than this on a key platform is a medium gap.
pub const MIN_PLATFORM_ITEMS: usize = 3;

/// Topic clusters smaller than this are thin.
pub const MIN_TOPIC_FREQUENCY: i32 = 3;

/// Entity coverage is only judged with at least this many approved items.
pub const MIN_APPROVED_FOR_ENTITY_GAPS: usize = 5;

/// How many of the top non-topic entities are checked for coverage.
pub const ENTITY_GAP_CANDIDATES: usize = 5;

pub const FRESHNESS_GAP_LABEL: &str = "stale-content";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub gap_type: GapType,
    pub gap_label: String,
    pub platform: Option<Platform>,
    pub severity: Severity,
}

pub fn detect_gaps(
    items: &[ContentItem],
    entities: &[Entity],
    content_entities: &[ContentEntity],
    freshness: f64,
) -> Vec<Gap> {
    let active: Vec<&ContentItem> = items.iter().filter(|i| i.status.is_active()).collect();
    let approved: Vec<&ContentItem> = items
        .iter()
        .filter(|i| i.status == ContentStatus::Approved)
        .collect();

    let mut gaps = platform_gaps(&active);
    gaps.extend(topic_gaps(entities));
    gaps.extend(entity_gaps(&approved, entities, content_entities));
    gaps.extend(freshness_gap(freshness));
    gaps
}

fn platform_gaps(active: &[&ContentItem]) -> Vec<Gap> {
    let mut per_platform: HashMap<Platform, usize> = HashMap::new();
    for item in active {
        *per_platform.entry(item.platform).or_default() += 1;
    }

    Platform::KEY_PLATFORMS
        .iter()
        .filter_map(|platform| {
            let severity = match per_platform.get(platform).copied().unwrap_or(0) {
                0 => Severity::High,
                n if n < MIN_PLATFORM_ITEMS => Severity::Medium,
                _ => return None,
            };
            Some(Gap {
                gap_type: GapType::Platform,
                gap_label: platform.as_str().to_string(),
                platform: Some(*platform),
                severity,
            })
        })
        .collect()
}

fn topic_gaps(entities: &[Entity]) -> Vec<Gap> {
    entities
        .iter()
        .filter(|e| e.entity_type == EntityType::Topic && e.frequency < MIN_TOPIC_FREQUENCY)
        .map(|topic| Gap {
            gap_type: GapType::Topic,
            gap_label: topic.label.clone(),
            platform: None,
            severity: if topic.frequency <= 1 {
                Severity::High
            } else {
                Severity::Medium
            },
        })
        .collect()
}

fn entity_gaps(approved: &[&ContentItem], entities: &[Entity], content_entities: &[ContentEntity]) -> Vec<Gap> {
    if approved.len() < MIN_APPROVED_FOR_ENTITY_GAPS {
        return Vec::new();
    }

    let named: Vec<Entity> = entities
        .iter()
        .filter(|e| e.entity_type != EntityType::Topic)
        .cloned()
        .collect();

    top_entities(&named, ENTITY_GAP_CANDIDATES)
        .into_iter()
        .filter_map(|entity| {
            let share = entity_coverage(entity.id, approved, content_entities);
            if share >= COHERENCE_TARGET {
                return None;
            }
            Some(Gap {
                gap_type: GapType::Entity,
                gap_label: entity.label.clone(),
                platform: None,
                severity: if share < COHERENCE_TARGET / 2.0 {
                    Severity::High
                } else {
                    Severity::Medium
                },
            })
        })
        .collect()
}

fn freshness_gap(freshness: f64) -> Option<Gap> {
    if freshness >= SUGGESTION_THRESHOLD {
        return None;
    }
    Some(Gap {
        gap_type: GapType::Freshness,
        gap_label: FRESHNESS_GAP_LABEL.to_string(),
        platform: None,
        severity: if freshness < CRITICAL_THRESHOLD {
            Severity::High
        } else {
            Severity::Medium
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::content_item;
    use chrono::Utc;
    use uuid::Uuid;

    fn entity(label: &str, entity_type: EntityType, frequency: i32) -> Entity {
        Entity {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            label: label.into(),
            normalized_label: label.to_lowercase(),
            entity_type,
            frequency,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn items_on(platform: Platform, count: usize) -> Vec<ContentItem> {
        (0..count)
            .map(|n| {
                let mut item = content_item(Uuid::nil(), &format!("https://{platform}.test/{n}"));
                item.platform = platform;
                item
            })
            .collect()
    }

    #[test]
    fn test_platform_gaps() {
        let mut items = items_on(Platform::Linkedin, 3);
        items.extend(items_on(Platform::Medium, 2));
        let mut rejected = items_on(Platform::Substack, 3);
        for item in &mut rejected {
            item.status = ContentStatus::Rejected;
        }
        items.extend(rejected);

        let gaps = detect_gaps(&items, &[], &[], 100.0);

        let medium = gaps.iter().find(|g| g.gap_label == "MEDIUM").unwrap();
        assert_eq!(medium.severity, Severity::Medium);
        let substack = gaps.iter().find(|g| g.gap_label == "SUBSTACK").unwrap();
        assert_eq!(substack.severity, Severity::High, "rejected items don't count");
        assert!(gaps.iter().all(|g| g.gap_label != "LINKEDIN"));
        assert_eq!(gaps.len(), 5);
    }

    #[test]
    fn test_thin_topics() {
        let entities = vec![
            entity("Rockets", EntityType::Topic, 1),
            entity("Hiring", EntityType::Topic, 2),
            entity("Launches", EntityType::Topic, 3),
            entity("Acme", EntityType::Brand, 1),
        ];

        let gaps: Vec<Gap> = detect_gaps(&[], &entities, &[], 100.0)
            .into_iter()
            .filter(|g| g.gap_type == GapType::Topic)
            .collect();

        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].gap_label, "Rockets");
        assert_eq!(gaps[0].severity, Severity::High);
        assert_eq!(gaps[1].severity, Severity::Medium);
    }

    #[test]
    fn test_entity_gaps_need_five_approved_items() {
        let acme = entity("Acme", EntityType::Brand, 10);
        let jane = entity("Jane Doe", EntityType::Person, 5);
        let items = items_on(Platform::News, 5);
        let links = vec![
            ContentEntity {
                id: Uuid::new_v4(),
                content_id: items[0].id,
                entity_id: acme.id,
                salience: 0.5,
                context: None,
                created_at: Utc::now(),
            },
            ContentEntity {
                id: Uuid::new_v4(),
                content_id: items[1].id,
                entity_id: acme.id,
                salience: 0.5,
                context: None,
                created_at: Utc::now(),
            },
        ];
        let entities = vec![acme, jane];

        let gaps: Vec<Gap> = detect_gaps(&items, &entities, &links, 100.0)
            .into_iter()
            .filter(|g| g.gap_type == GapType::Entity)
            .collect();

        // Acme at 40% meets the target; Jane at 0% is a high gap
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].gap_label, "Jane Doe");
        assert_eq!(gaps[0].severity, Severity::High);

        let too_few = detect_gaps(&items[..4], &entities, &links, 100.0);
        assert!(too_few.iter().all(|g| g.gap_type != GapType::Entity));
    }

    #[test]
    fn test_freshness_gap_thresholds() {
        assert!(freshness_gap(60.0).is_none());
        assert_eq!(freshness_gap(59.0).unwrap().severity, Severity::Medium);
        let stale = freshness_gap(39.9).unwrap();
        assert_eq!(stale.severity, Severity::High);
        assert_eq!(stale.gap_label, FRESHNESS_GAP_LABEL);
    }
}
