use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ScoreCard;

pub const TECHNICAL_WEIGHT: f64 = 0.4;
pub const FINANCIAL_WEIGHT: f64 = 0.4;
pub const EXPERIENCE_WEIGHT: f64 = 0.2;

pub const FINAL_THRESHOLD: f64 = 80.0;
pub const FINANCIAL_THRESHOLD: f64 = 70.0;
pub const TECHNICAL_THRESHOLD: f64 = 60.0;

/// Ordered evaluation phases: `Initial < Technical < Financial < Final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStage {
    Initial,
    Technical,
    Financial,
    Final,
}

impl EvaluationStage {
    pub const ALL: [EvaluationStage; 4] = [
        EvaluationStage::Initial,
        EvaluationStage::Technical,
        EvaluationStage::Financial,
        EvaluationStage::Final,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            EvaluationStage::Initial => "INITIAL",
            EvaluationStage::Technical => "TECHNICAL",
            EvaluationStage::Financial => "FINANCIAL",
            EvaluationStage::Final => "FINAL",
        }
    }
}

impl fmt::Display for EvaluationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown evaluation stage '{0}'")]
pub struct UnknownStage(pub String);

impl FromStr for EvaluationStage {
    type Err = UnknownStage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INITIAL" => Ok(EvaluationStage::Initial),
            "TECHNICAL" => Ok(EvaluationStage::Technical),
            "FINANCIAL" => Ok(EvaluationStage::Financial),
            "FINAL" => Ok(EvaluationStage::Final),
            other => Err(UnknownStage(other.to_string())),
        }
    }
}

/// Weighted sum of the sub-scores. No rounding; callers round for display only.
pub fn composite_score(scores: &ScoreCard) -> f64 {
    scores.technical_score * TECHNICAL_WEIGHT
        + scores.financial_score * FINANCIAL_WEIGHT
        + scores.experience_score * EXPERIENCE_WEIGHT
}

/// Step function over the composite, checked from the highest band down.
///
/// Each band's lower bound is inclusive. A NaN composite fails every comparison and lands
/// in `Initial`.
pub fn classify_stage(scores: &ScoreCard) -> EvaluationStage {
    let composite = composite_score(scores);

    if composite >= FINAL_THRESHOLD {
        EvaluationStage::Final
    } else if composite >= FINANCIAL_THRESHOLD {
        EvaluationStage::Financial
    } else if composite >= TECHNICAL_THRESHOLD {
        EvaluationStage::Technical
    } else {
        EvaluationStage::Initial
    }
}
