use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::maturity::{classify, MaturityLabel};

/// Fixed ordinal vocabulary offered for every questionnaire prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResponseLabel {
    #[serde(rename = "Not at all")]
    NotAtAll,
    #[serde(rename = "Slightly")]
    Slightly,
    #[serde(rename = "Moderately")]
    Moderately,
    #[serde(rename = "Very")]
    Very,
    #[serde(rename = "Fully")]
    Fully,
}

impl ResponseLabel {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::NotAtAll,
            Self::Slightly,
            Self::Moderately,
            Self::Very,
            Self::Fully,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotAtAll => "Not at all",
            Self::Slightly => "Slightly",
            Self::Moderately => "Moderately",
            Self::Very => "Very",
            Self::Fully => "Fully",
        }
    }

    pub const fn score(self) -> u8 {
        match self {
            Self::NotAtAll => 1,
            Self::Slightly => 2,
            Self::Moderately => 3,
            Self::Very => 4,
            Self::Fully => 5,
        }
    }
}

impl fmt::Display for ResponseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResponseLabel {
    type Err = ScoringError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|label| label.label() == raw)
            .ok_or_else(|| ScoringError::InvalidResponseLabel(raw.to_string()))
    }
}

/// Map a raw response label to its integer score in `1..=5`.
pub fn normalize(raw: &str) -> Result<u8, ScoringError> {
    raw.parse::<ResponseLabel>().map(ResponseLabel::score)
}

/// Arithmetic mean rounded to two decimals; an empty slice yields `0.0`.
pub fn aggregate(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }

    let total: u32 = scores.iter().map(|score| u32::from(*score)).sum();
    round_to_hundredths(f64::from(total) / scores.len() as f64)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average score and the maturity band it falls in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub average: f64,
    pub maturity: MaturityLabel,
}

impl ScoreResult {
    pub fn from_scores(scores: &[u8]) -> Result<Self, ScoringError> {
        let average = aggregate(scores);
        let maturity = classify(average)?;
        Ok(Self { average, maturity })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("'{0}' is not one of the accepted response labels")]
    InvalidResponseLabel(String),
    #[error("average score {0} lies outside 0.0..=5.0")]
    ScoreOutOfRange(f64),
}
