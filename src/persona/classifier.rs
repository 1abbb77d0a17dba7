use super::{
    answers::{PersonaAnswers, QuestionKey},
    label::PersonaLabel,
};

/// Map questionnaire answers to a persona label.
///
/// Rules are checked in order and the first match wins, so a "Love wins" reader
/// who also holds on to hope is an optimist before anything else. Unanswered
/// questions never match.
pub fn classify(answers: &PersonaAnswers) -> PersonaLabel {
    use QuestionKey::*;

    let ending = |value| answers.is(Ending, value);
    let is = |key, value| answers.is(key, value);

    if ending("Love wins") && is(HopeOrHonesty, "Unshakeable Hope") {
        PersonaLabel::RomanticOptimist
    } else if ending("Justice served") && is(JusticeOrMercy, "Justice") {
        PersonaLabel::RighteousJudge
    } else if ending("Bittersweet") && is(HopeOrHonesty, "Brutal Honesty") {
        PersonaLabel::MelancholicRealist
    } else if ending("Twist you never saw coming") && is(TwistOrPayoff, "Shocking Twist") {
        PersonaLabel::MysterySeeker
    } else if is(GreaterGoodOrPersonalBond, "Greater Good") && is(JusticeOrMercy, "Justice") {
        PersonaLabel::NobleHero
    } else if is(GreaterGoodOrPersonalBond, "Personal Bond") && is(JusticeOrMercy, "Mercy") {
        PersonaLabel::CompassionateSoul
    } else if ending("Love wins") && is(HopeOrHonesty, "Brutal Honesty") {
        PersonaLabel::RomanticRealist
    } else {
        PersonaLabel::EclecticReader
    }
}
