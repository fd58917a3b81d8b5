use super::super::domain::BidStatus;
use super::stage::EvaluationStage;

impl EvaluationStage {
    /// Persisted status for a stage. `Financial` must stay `Shortlisted`: shortlist views
    /// filter on that status alone.
    pub const fn bid_status(self) -> BidStatus {
        match self {
            EvaluationStage::Initial => BidStatus::UnderReview,
            EvaluationStage::Technical => BidStatus::TechnicalEvaluation,
            EvaluationStage::Financial => BidStatus::Shortlisted,
            EvaluationStage::Final => BidStatus::FinalEvaluation,
        }
    }
}

/// Lenient lookup for stage names read back from storage or request payloads.
///
/// Only exact canonical names match; anything else maps to `UnderReview`.
pub fn map_stage_to_status(stage: &str) -> BidStatus {
    stage
        .parse::<EvaluationStage>()
        .map(EvaluationStage::bid_status)
        .unwrap_or(BidStatus::UnderReview)
}
