//! Deterministic scoring of a bid's three sub-scores into a tender stage and bid status.
//!
//! Everything here is pure: no I/O, no shared state, and no failure path. Malformed input
//! (NaN, negative or oversized scores, unrecognised stage names) falls through to the
//! lowest stage and `UNDER_REVIEW` rather than erroring. Range validation belongs to the
//! caller.

mod stage;
mod status;

pub use stage::{
    classify_stage, composite_score, EvaluationStage, UnknownStage, EXPERIENCE_WEIGHT,
    FINANCIAL_THRESHOLD, FINANCIAL_WEIGHT, FINAL_THRESHOLD, TECHNICAL_THRESHOLD,
    TECHNICAL_WEIGHT,
};
pub use status::map_stage_to_status;

use super::domain::BidStatus;
use serde::{Deserialize, Serialize};

/// The three weighted sub-scores an evaluator submits for a bid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    #[serde(alias = "technical_score")]
    pub technical_score: f64,
    #[serde(alias = "financial_score")]
    pub financial_score: f64,
    #[serde(alias = "experience_score")]
    pub experience_score: f64,
}

impl ScoreCard {
    pub const fn new(technical_score: f64, financial_score: f64, experience_score: f64) -> Self {
        Self {
            technical_score,
            financial_score,
            experience_score,
        }
    }

    /// Same score on every axis.
    pub const fn uniform(score: f64) -> Self {
        Self::new(score, score, score)
    }
}

/// Outputs of a single evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageAssessment {
    pub composite_score: f64,
    pub stage: EvaluationStage,
    pub status: BidStatus,
}

/// `map_stage_to_status(classify_stage(scores))`, keeping the composite for display and logs.
pub fn evaluate(scores: &ScoreCard) -> StageAssessment {
    let composite = composite_score(scores);
    let stage = classify_stage(scores);
    let status = map_stage_to_status(stage.as_str());

    StageAssessment {
        composite_score: composite,
        stage,
        status,
    }
}
