use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The mini-games the server knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    SquatTap,
    JumpCounter,
    PlankTimer,
    BurpeeChallenge,
}

/// How an action changes the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringRule {
    /// Every action adds one rep.
    Tap,
    /// The score is the number of whole seconds held since the start.
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub points: f64,
    pub calories: f64,
}

impl VariantKind {
    pub const ALL: [VariantKind; 4] = [
        VariantKind::SquatTap,
        VariantKind::JumpCounter,
        VariantKind::PlankTimer,
        VariantKind::BurpeeChallenge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VariantKind::SquatTap => "squat_tap",
            VariantKind::JumpCounter => "jump_counter",
            VariantKind::PlankTimer => "plank_timer",
            VariantKind::BurpeeChallenge => "burpee_challenge",
        }
    }

    pub fn scoring_rule(self) -> ScoringRule {
        match self {
            VariantKind::SquatTap | VariantKind::JumpCounter | VariantKind::BurpeeChallenge => {
                ScoringRule::Tap
            }
            VariantKind::PlankTimer => ScoringRule::Hold,
        }
    }

    /// Linear per-unit multipliers used for the live points/calories estimate.
    pub fn coefficients(self) -> Coefficients {
        let (points, calories) = match self {
            VariantKind::SquatTap => (2.0, 0.5),
            VariantKind::JumpCounter => (3.0, 0.8),
            VariantKind::PlankTimer => (5.0, 0.1),
            VariantKind::BurpeeChallenge => (10.0, 1.5),
        };
        Coefficients { points, calories }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown game type '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for VariantKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        VariantKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownVariant(value.to_string()))
    }
}
