//! Onboarding questionnaire answers.
//!
//! Answers are filled in one question at a time while the quiz runs. Blank answers
//! are stored as given but read back as unanswered.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ReaderError, Result};

use super::{classifier::classify, label::PersonaLabel};

pub const MIN_VIBES: usize = 3;
pub const MAX_VIBES: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKey {
    Ending,
    JusticeOrMercy,
    PlanOrMess,
    RiskOrFaith,
    TwistOrPayoff,
    HopeOrHonesty,
    GreaterGoodOrPersonalBond,
    FavoriteTwist,
}

impl QuestionKey {
    /// The six either/or questions that feed the secondary ranking score.
    pub const BINARY: [QuestionKey; 6] = [
        QuestionKey::JusticeOrMercy,
        QuestionKey::PlanOrMess,
        QuestionKey::RiskOrFaith,
        QuestionKey::TwistOrPayoff,
        QuestionKey::HopeOrHonesty,
        QuestionKey::GreaterGoodOrPersonalBond,
    ];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonaAnswers {
    pub ending: Option<String>,
    pub justice_or_mercy: Option<String>,
    pub plan_or_mess: Option<String>,
    pub risk_or_faith: Option<String>,
    pub twist_or_payoff: Option<String>,
    pub hope_or_honesty: Option<String>,
    pub greater_good_or_personal_bond: Option<String>,
    pub favorite_twist: Option<String>,
    // Distinct tags, changed only through `toggle_vibe`.
    #[serde(deserialize_with = "deserialize_vibes")]
    vibes: Vec<String>,
}

/// Stored vibe lists keep their first occurrence of each tag.
fn deserialize_vibes<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut vibes = Vec::<String>::deserialize(deserializer)?;
    let mut seen = HashSet::new();
    vibes.retain(|vibe| seen.insert(vibe.clone()));
    Ok(vibes)
}

impl PersonaAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: QuestionKey) -> &Option<String> {
        match key {
            QuestionKey::Ending => &self.ending,
            QuestionKey::JusticeOrMercy => &self.justice_or_mercy,
            QuestionKey::PlanOrMess => &self.plan_or_mess,
            QuestionKey::RiskOrFaith => &self.risk_or_faith,
            QuestionKey::TwistOrPayoff => &self.twist_or_payoff,
            QuestionKey::HopeOrHonesty => &self.hope_or_honesty,
            QuestionKey::GreaterGoodOrPersonalBond => &self.greater_good_or_personal_bond,
            QuestionKey::FavoriteTwist => &self.favorite_twist,
        }
    }

    fn slot_mut(&mut self, key: QuestionKey) -> &mut Option<String> {
        match key {
            QuestionKey::Ending => &mut self.ending,
            QuestionKey::JusticeOrMercy => &mut self.justice_or_mercy,
            QuestionKey::PlanOrMess => &mut self.plan_or_mess,
            QuestionKey::RiskOrFaith => &mut self.risk_or_faith,
            QuestionKey::TwistOrPayoff => &mut self.twist_or_payoff,
            QuestionKey::HopeOrHonesty => &mut self.hope_or_honesty,
            QuestionKey::GreaterGoodOrPersonalBond => &mut self.greater_good_or_personal_bond,
            QuestionKey::FavoriteTwist => &mut self.favorite_twist,
        }
    }

    /// Non-blank answer for `key`.
    pub fn answer(&self, key: QuestionKey) -> Option<&str> {
        self.slot(key)
            .as_deref()
            .filter(|answer| !answer.trim().is_empty())
    }

    /// Whether `key` was answered with exactly `expected`.
    pub fn is(&self, key: QuestionKey, expected: &str) -> bool {
        self.answer(key) == Some(expected)
    }

    pub fn set(&mut self, key: QuestionKey, answer: impl Into<String>) {
        *self.slot_mut(key) = Some(answer.into());
    }

    pub fn with(mut self, key: QuestionKey, answer: impl Into<String>) -> Self {
        self.set(key, answer);
        self
    }

    /// Distinct selected vibes in selection order, blanks skipped.
    pub fn vibes(&self) -> impl Iterator<Item = &str> {
        let mut seen = HashSet::new();
        self.vibes
            .iter()
            .map(String::as_str)
            .filter(|vibe| !vibe.trim().is_empty())
            .filter(move |vibe| seen.insert(*vibe))
    }

    /// Select or deselect `vibe`. Selection stops growing at five tags; returns
    /// whether the vibe is selected afterwards.
    pub fn toggle_vibe(&mut self, vibe: &str) -> bool {
        if let Some(index) = self.vibes.iter().position(|v| v == vibe) {
            self.vibes.remove(index);
            return false;
        }
        if self.vibes.len() >= MAX_VIBES {
            return false;
        }
        self.vibes.push(vibe.to_string());
        true
    }

    /// Freeze the answers and classify them.
    pub fn finalize(self, classified_at: DateTime<Utc>) -> Result<CompletedPersona> {
        let count = self.vibes().count();
        if !(MIN_VIBES..=MAX_VIBES).contains(&count) {
            return Err(ReaderError::InvalidVibeSelection { count });
        }

        Ok(CompletedPersona {
            persona: classify(&self),
            answers: self,
            classified_at,
        })
    }
}

/// Answers of a finished onboarding run together with the label derived from them.
///
/// Fields are read-only; a new onboarding run builds a new value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPersona {
    answers: PersonaAnswers,
    persona: PersonaLabel,
    classified_at: DateTime<Utc>,
}

impl CompletedPersona {
    pub fn answers(&self) -> &PersonaAnswers {
        &self.answers
    }

    pub fn label(&self) -> PersonaLabel {
        self.persona
    }

    pub fn classified_at(&self) -> DateTime<Utc> {
        self.classified_at
    }

    /// Recompute the label from the stored answers. Used after loading so a
    /// hand-edited label cannot disagree with the answers.
    pub fn reclassified(mut self) -> Self {
        self.persona = classify(&self.answers);
        self
    }
}
