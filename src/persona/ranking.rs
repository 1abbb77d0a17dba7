use serde::Serialize;

use crate::catalog::ContentItem;

use super::{
    answers::{PersonaAnswers, QuestionKey},
    config::{ending_tags, RankingWeights},
};

/// Per-factor contribution to an item's persona score.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub ending: i64,
    pub vibe: i64,
    pub favorite_twist: i64,
    pub secondary: i64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i64 {
        self.ending + self.vibe + self.favorite_twist + self.secondary
    }
}

pub fn score_item(
    item: &ContentItem,
    answers: &PersonaAnswers,
    weights: &RankingWeights,
) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown::default();

    if let Some(ending) = answers.answer(QuestionKey::Ending) {
        if ending_tags(ending).iter().any(|tag| item.has_category(tag)) {
            breakdown.ending = weights.ending;
        }
    }

    // Containment, not equality: "Epic & Grandiose" matches
    // "Epic & Grandiose Adventure". Every matching category counts.
    for vibe in answers.vibes() {
        let matches = count_containing(item, vibe);
        breakdown.vibe += weights.vibe * matches;
    }

    if let Some(twist) = answers.answer(QuestionKey::FavoriteTwist) {
        if item.has_category(twist) {
            breakdown.favorite_twist = weights.favorite_twist;
        }
    }

    for key in QuestionKey::BINARY {
        if let Some(answer) = answers.answer(key) {
            breakdown.secondary += weights.secondary * count_containing(item, answer);
        }
    }

    breakdown
}

fn count_containing(item: &ContentItem, needle: &str) -> i64 {
    item.categories
        .iter()
        .filter(|category| category.contains(needle))
        .count() as i64
}

/// Order `catalog` by descending persona score with the default weights.
pub fn rank_by_persona(catalog: &[ContentItem], answers: &PersonaAnswers) -> Vec<ContentItem> {
    rank_with_weights(catalog, answers, &RankingWeights::default())
}

/// Items with equal scores keep their catalog order.
pub fn rank_with_weights(
    catalog: &[ContentItem],
    answers: &PersonaAnswers,
    weights: &RankingWeights,
) -> Vec<ContentItem> {
    let mut scored: Vec<(i64, &ContentItem)> = catalog
        .iter()
        .map(|item| (score_item(item, answers, weights).total(), item))
        .collect();

    // sort_by is stable.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, item)| item.clone()).collect()
}
