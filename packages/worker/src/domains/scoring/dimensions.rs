//! Readiness dimensions.
//!
//! Pure functions over a project's content, entities and associations.
//! Every dimension is in `[0, 100]`.
//!
//! | Dimension | Weight | Items considered |
//! |-----------|--------|------------------|
//! | coverage  | 25%    | active           |
//! | depth     | 25%    | approved         |
//! | freshness | 20%    | active, dated    |
//! | authority | 15%    | active           |
//! | coherence | 15%    | approved         |
//!
//! "Active" means DISCOVERED or APPROVED.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::domains::content::{ContentEntity, ContentItem, ContentStatus, Entity, Platform};

/// Dimensions below this are weak and get a suggestion or a gap.
pub const SUGGESTION_THRESHOLD: f64 = 60.0;

/// Dimensions below this are high-severity gaps.
pub const CRITICAL_THRESHOLD: f64 = 40.0;

/// Share of approved items an entity should appear in.
pub const COHERENCE_TARGET: f64 = 0.4;

/// Average word count that earns full depth.
pub const TARGET_WORD_COUNT: f64 = 800.0;

pub const WEIGHT_COVERAGE: f64 = 0.25;
pub const WEIGHT_DEPTH: f64 = 0.25;
pub const WEIGHT_FRESHNESS: f64 = 0.20;
pub const WEIGHT_AUTHORITY: f64 = 0.15;
pub const WEIGHT_COHERENCE: f64 = 0.15;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
    pub coverage: f64,
    pub depth: f64,
    pub freshness: f64,
    pub authority: f64,
    pub coherence: f64,
}

impl Dimensions {
    /// Weighted sum, rounded to the nearest integer.
    pub fn overall(&self) -> i32 {
        (WEIGHT_COVERAGE * self.coverage
            + WEIGHT_DEPTH * self.depth
            + WEIGHT_FRESHNESS * self.freshness
            + WEIGHT_AUTHORITY * self.authority
            + WEIGHT_COHERENCE * self.coherence)
            .round() as i32
    }

    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("coverage", self.coverage),
            ("depth", self.depth),
            ("freshness", self.freshness),
            ("authority", self.authority),
            ("coherence", self.coherence),
        ]
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.named()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// Dimensions under [`SUGGESTION_THRESHOLD`], weakest first.
    pub fn weak(&self) -> Vec<(&'static str, f64)> {
        let mut weak: Vec<_> = self
            .named()
            .into_iter()
            .filter(|(_, value)| *value < SUGGESTION_THRESHOLD)
            .collect();
        weak.sort_by(|a, b| a.1.total_cmp(&b.1));
        weak
    }
}

pub fn compute(
    items: &[ContentItem],
    entities: &[Entity],
    content_entities: &[ContentEntity],
    now: DateTime<Utc>,
) -> Dimensions {
    let active: Vec<&ContentItem> = items.iter().filter(|i| i.status.is_active()).collect();
    let approved: Vec<&ContentItem> = items
        .iter()
        .filter(|i| i.status == ContentStatus::Approved)
        .collect();

    Dimensions {
        coverage: coverage(&active),
        depth: depth(&approved),
        freshness: freshness(&active, now),
        authority: authority(&active),
        coherence: coherence(&approved, entities, content_entities),
    }
}

pub fn coverage(items: &[&ContentItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let platforms: HashSet<Platform> = items.iter().map(|i| i.platform).collect();
    let off_site = items
        .iter()
        .filter(|i| i.platform != Platform::Website)
        .count();
    let key_count = Platform::KEY_PLATFORMS.len() as f64;

    0.6 * (platforms.len() as f64 / key_count).min(1.0) * 100.0
        + 0.4 * (off_site as f64 / items.len() as f64) * 100.0
}

pub fn depth(approved: &[&ContentItem]) -> f64 {
    if approved.is_empty() {
        return 0.0;
    }
    let counted: Vec<f64> = approved
        .iter()
        .filter_map(|i| i.word_count)
        .map(f64::from)
        .collect();
    let avg_words = if counted.is_empty() {
        0.0
    } else {
        counted.iter().sum::<f64>() / counted.len() as f64
    };
    let with_text = approved.iter().filter(|i| i.has_raw_text()).count();

    0.5 * (avg_words / TARGET_WORD_COUNT).min(1.0) * 100.0
        + 0.5 * (with_text as f64 / approved.len() as f64) * 100.0
}

/// Whole calendar months from `from` to `to`. Negative when `from` is later.
pub fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i32 {
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months
}

/// Weight of one item's publish date.
pub fn recency_weight(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    match months_between(published_at, now) {
        m if m < 6 => 1.0,
        6 if published_at.day() == now.day() => 1.0,
        m if m < 12 => 0.5,
        12 if published_at.day() == now.day() => 0.5,
        m if m < 24 => 0.1,
        24 if published_at.day() == now.day() => 0.1,
        _ => 0.0,
    }
}

pub fn freshness(items: &[&ContentItem], now: DateTime<Utc>) -> f64 {
    let weights: Vec<f64> = items
        .iter()
        .filter_map(|i| i.published_at)
        .map(|published| recency_weight(published, now))
        .collect();
    if weights.is_empty() {
        return 0.0;
    }
    weights.iter().sum::<f64>() / weights.len() as f64 * 100.0
}

pub fn authority(items: &[&ContentItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(|i| i.platform.authority()).sum::<f64>() / items.len() as f64
}

/// The `limit` most frequent entities. Ties go to the label that sorts first.
pub fn top_entities<'a>(entities: &'a [Entity], limit: usize) -> Vec<&'a Entity> {
    let mut ranked: Vec<&Entity> = entities.iter().collect();
    ranked.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| a.normalized_label.cmp(&b.normalized_label))
    });
    ranked.truncate(limit);
    ranked
}

/// Fraction of `approved` items associated with `entity_id`.
pub fn entity_coverage(entity_id: Uuid, approved: &[&ContentItem], content_entities: &[ContentEntity]) -> f64 {
    if approved.is_empty() {
        return 0.0;
    }
    let approved_ids: HashSet<Uuid> = approved.iter().map(|i| i.id).collect();
    let mentioning: HashSet<Uuid> = content_entities
        .iter()
        .filter(|ce| ce.entity_id == entity_id && approved_ids.contains(&ce.content_id))
        .map(|ce| ce.content_id)
        .collect();
    mentioning.len() as f64 / approved.len() as f64
}

pub fn coherence(approved: &[&ContentItem], entities: &[Entity], content_entities: &[ContentEntity]) -> f64 {
    let top = top_entities(entities, 3);
    if approved.is_empty() || top.is_empty() {
        return 0.0;
    }
    let total: f64 = top
        .iter()
        .map(|entity| {
            let share = entity_coverage(entity.id, approved, content_entities);
            (share / COHERENCE_TARGET).min(1.0) * 100.0
        })
        .sum();
    total / top.len() as f64
}
