pub mod answers;
pub mod classifier;
pub mod config;
pub mod label;
pub mod ranking;

pub use answers::{CompletedPersona, PersonaAnswers, QuestionKey, MAX_VIBES, MIN_VIBES};
pub use classifier::classify;
pub use config::RankingWeights;
pub use label::PersonaLabel;
pub use ranking::{rank_by_persona, rank_with_weights, score_item, ScoreBreakdown};
