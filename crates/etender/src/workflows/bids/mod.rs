//! Bid intake, evaluation and award workflow.
//!
//! `evaluation` is the pure scoring core. The service wraps it with the bid store, the
//! append-only evaluation log and bidder notifications, and the router exposes it over HTTP.

mod award;
pub mod domain;
pub mod evaluation;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use award::{AwardOutcome, AwardRequest};
pub use domain::{
    BidId, BidRecord, BidStatus, BidStatusView, BidSubmission, BidderId, EvaluatorId, TenderId,
    TenderStatus,
};
pub use evaluation::{
    classify_stage, composite_score, evaluate, map_stage_to_status, EvaluationStage, ScoreCard,
    StageAssessment,
};
pub use repository::{
    BidNotification, BidRepository, EvaluationLog, EvaluationLogEntry, NotificationDispatcher,
    NotificationError, NotificationKind, RepositoryError,
};
pub use router::bid_router;
pub use service::{
    BidEvaluationService, BidServiceError, EvaluationReceipt, EvaluationRequest, ShortlistPage,
    ValidationError,
};
