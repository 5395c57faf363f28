use std::fmt;

use serde::{Deserialize, Serialize};

use super::rubric::Division;

/// Whole-number rating on the 0-5 rubric scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Score::new)
            .ok_or(ScoreOutOfRange(value))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("score {0} is outside the 0-5 range")]
pub struct ScoreOutOfRange(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionScore {
    pub score: Score,
    pub reasoning: String,
    pub key_indicators: Vec<String>,
}

/// Validated model verdict for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub erw_retaining_walls: DivisionScore,
    pub kaufman_concrete: DivisionScore,
    pub landtec_landscape: DivisionScore,
    pub ratliff_hardscape: DivisionScore,
    pub overall_recommendation: String,
    pub package_score: Score,
}

impl ScoreResult {
    pub fn division(&self, division: Division) -> &DivisionScore {
        match division {
            Division::ErwRetainingWalls => &self.erw_retaining_walls,
            Division::KaufmanConcrete => &self.kaufman_concrete,
            Division::LandtecLandscape => &self.landtec_landscape,
            Division::RatliffHardscape => &self.ratliff_hardscape,
        }
    }
}

/// Why a model reply was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("response did not contain a JSON object")]
    NoJson,
    #[error("response JSON did not match the required shape: {0}")]
    Shape(String),
}

/// Extracts and validates the JSON verdict from a raw model reply.
pub fn parse_score_response(raw: &str) -> Result<ScoreResult, ValidationError> {
    let body = extract_json(raw).ok_or(ValidationError::NoJson)?;
    serde_json::from_str(body).map_err(|err| ValidationError::Shape(err.to_string()))
}

fn extract_json(raw: &str) -> Option<&str> {
    let fenced = if let Some((_, rest)) = raw.split_once("```json") {
        Some(rest.split("```").next().unwrap_or(rest))
    } else if let Some((_, rest)) = raw.split_once("```") {
        Some(rest.split("```").next().unwrap_or(rest))
    } else {
        None
    };

    let candidate = fenced.unwrap_or(raw).trim();
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    (start < end).then(|| &candidate[start..=end])
}
