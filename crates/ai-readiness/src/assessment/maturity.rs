use serde::{Deserialize, Serialize};
use std::fmt;

use super::scoring::ScoringError;

pub const MIN_AVERAGE: f64 = 0.0;
pub const MAX_AVERAGE: f64 = 5.0;

/// Ordered AI adoption bands. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaturityLabel {
    Beginner,
    Emerging,
    Established,
    Advanced,
    #[serde(rename = "AI Leader")]
    AiLeader,
}

impl MaturityLabel {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Beginner,
            Self::Emerging,
            Self::Established,
            Self::Advanced,
            Self::AiLeader,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Emerging => "Emerging",
            Self::Established => "Established",
            Self::Advanced => "Advanced",
            Self::AiLeader => "AI Leader",
        }
    }

    /// Inclusive upper bound of the band. The lower bound is the previous band's
    /// upper bound (exclusive), or `MIN_AVERAGE` (inclusive) for `Beginner`.
    pub const fn upper_bound(self) -> f64 {
        match self {
            Self::Beginner => 1.5,
            Self::Emerging => 2.5,
            Self::Established => 3.5,
            Self::Advanced => 4.5,
            Self::AiLeader => MAX_AVERAGE,
        }
    }
}

impl fmt::Display for MaturityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map an average score in `0.0..=5.0` to its maturity band.
pub fn classify(average: f64) -> Result<MaturityLabel, ScoringError> {
    if !(MIN_AVERAGE..=MAX_AVERAGE).contains(&average) {
        return Err(ScoringError::ScoreOutOfRange(average));
    }

    let label = MaturityLabel::ordered()
        .into_iter()
        .find(|band| average <= band.upper_bound())
        .unwrap_or(MaturityLabel::AiLeader);
    Ok(label)
}
