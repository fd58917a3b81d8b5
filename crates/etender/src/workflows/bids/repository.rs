use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{BidId, BidRecord, BidStatus, BidderId, EvaluatorId, TenderId, TenderStatus};
use super::evaluation::{EvaluationStage, ScoreCard};

/// Bid store abstraction so the evaluation service can be exercised in isolation.
///
/// `update` overwrites unconditionally: concurrent evaluations of one bid race and the last
/// write wins.
pub trait BidRepository: Send + Sync {
    fn insert(&self, record: BidRecord) -> Result<BidRecord, RepositoryError>;
    fn update(&self, record: BidRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &BidId) -> Result<Option<BidRecord>, RepositoryError>;
    fn for_tender(&self, tender_id: &TenderId) -> Result<Vec<BidRecord>, RepositoryError>;
    fn update_tender_status(
        &self,
        tender_id: &TenderId,
        status: TenderStatus,
    ) -> Result<(), RepositoryError>;
}

/// Append-only audit trail of evaluation passes.
pub trait EvaluationLog: Send + Sync {
    fn append(&self, entry: EvaluationLogEntry) -> Result<EvaluationLogEntry, RepositoryError>;
    /// Entries for a bid in the order they were appended.
    fn for_bid(&self, bid_id: &BidId) -> Result<Vec<EvaluationLogEntry>, RepositoryError>;
}

/// Immutable record of one evaluation submission's inputs and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationLogEntry {
    pub entry_id: String,
    pub bid_id: BidId,
    pub tender_id: TenderId,
    pub evaluator_id: EvaluatorId,
    /// Absent for award entries, which are not scored.
    pub scores: Option<ScoreCard>,
    pub composite_score: f64,
    pub stage: EvaluationStage,
    pub status: BidStatus,
    pub comments: String,
    pub recorded_at: DateTime<Utc>,
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound bidder notifications (in-app inbox, e-mail adapters).
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: BidNotification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    BidShortlisted,
    BidAwarded,
    BidRejected,
}

impl NotificationKind {
    pub const fn template(self) -> &'static str {
        match self {
            NotificationKind::BidShortlisted => "bid_shortlisted",
            NotificationKind::BidAwarded => "bid_awarded",
            NotificationKind::BidRejected => "bid_rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidNotification {
    pub kind: NotificationKind,
    pub bid_id: BidId,
    pub tender_id: TenderId,
    pub bidder_id: BidderId,
    pub message: String,
}

impl BidNotification {
    pub(crate) fn for_bid(kind: NotificationKind, record: &BidRecord) -> Self {
        let message = match kind {
            NotificationKind::BidShortlisted => format!(
                "Your bid for tender {} has been shortlisted.",
                record.tender_id
            ),
            NotificationKind::BidAwarded => format!(
                "Your bid for tender {} has been selected as the winning bid.",
                record.tender_id
            ),
            NotificationKind::BidRejected => format!(
                "Your bid for tender {} was not selected.",
                record.tender_id
            ),
        };

        Self {
            kind,
            bid_id: record.bid_id.clone(),
            tender_id: record.tender_id.clone(),
            bidder_id: record.bidder_id,
            message,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
