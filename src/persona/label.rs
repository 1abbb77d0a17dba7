use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PersonaLabel {
    #[serde(rename = "The Romantic Optimist")]
    RomanticOptimist,
    #[serde(rename = "The Righteous Judge")]
    RighteousJudge,
    #[serde(rename = "The Melancholic Realist")]
    MelancholicRealist,
    #[serde(rename = "The Mystery Seeker")]
    MysterySeeker,
    #[serde(rename = "The Noble Hero")]
    NobleHero,
    #[serde(rename = "The Compassionate Soul")]
    CompassionateSoul,
    #[serde(rename = "The Romantic Realist")]
    RomanticRealist,
    #[serde(rename = "The Eclectic Reader")]
    EclecticReader,
}

impl PersonaLabel {
    pub const ALL: [PersonaLabel; 8] = [
        PersonaLabel::RomanticOptimist,
        PersonaLabel::RighteousJudge,
        PersonaLabel::MelancholicRealist,
        PersonaLabel::MysterySeeker,
        PersonaLabel::NobleHero,
        PersonaLabel::CompassionateSoul,
        PersonaLabel::RomanticRealist,
        PersonaLabel::EclecticReader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaLabel::RomanticOptimist => "The Romantic Optimist",
            PersonaLabel::RighteousJudge => "The Righteous Judge",
            PersonaLabel::MelancholicRealist => "The Melancholic Realist",
            PersonaLabel::MysterySeeker => "The Mystery Seeker",
            PersonaLabel::NobleHero => "The Noble Hero",
            PersonaLabel::CompassionateSoul => "The Compassionate Soul",
            PersonaLabel::RomanticRealist => "The Romantic Realist",
            PersonaLabel::EclecticReader => "The Eclectic Reader",
        }
    }
}

impl fmt::Display for PersonaLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
