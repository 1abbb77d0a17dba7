/// Weights for the persona ranking score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingWeights {
    /// Item carries a tag matching the preferred ending
    pub ending: i64,

    /// Per (vibe, category) containment
    pub vibe: i64,

    /// Item carries the favorite twist tag
    pub favorite_twist: i64,

    /// Per (binary answer, category) containment
    pub secondary: i64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            ending: 3,
            vibe: 2,
            favorite_twist: 3,
            secondary: 1,
        }
    }
}

/// Category tags that satisfy each ending preference.
pub fn ending_tags(ending: &str) -> &'static [&'static str] {
    match ending {
        "Love wins" => &["Love wins"],
        "Justice served" => &["Justice served"],
        "Bittersweet" => &["Tragic & Cathartic"],
        "Twist you never saw coming" => &[
            "Identity reveal",
            "Hidden betrayal",
            "Time/reality bend",
            "Karma hits hard",
        ],
        _ => &[],
    }
}
