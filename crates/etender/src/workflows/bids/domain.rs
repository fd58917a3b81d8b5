use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::StageAssessment;

/// Identifier wrapper for submitted bids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BidId(pub String);

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for published tenders.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TenderId(pub String);

impl fmt::Display for TenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Procurement officer account that scored a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluatorId(pub u64);

impl fmt::Display for EvaluatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vendor account that owns a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidderId(pub u64);

/// Persisted lifecycle field that shortlist queries, award checks and badges key off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStatus {
    Pending,
    UnderReview,
    TechnicalEvaluation,
    Shortlisted,
    FinalEvaluation,
    Accepted,
    Rejected,
}

impl BidStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BidStatus::Pending => "PENDING",
            BidStatus::UnderReview => "UNDER_REVIEW",
            BidStatus::TechnicalEvaluation => "TECHNICAL_EVALUATION",
            BidStatus::Shortlisted => "SHORTLISTED",
            BidStatus::FinalEvaluation => "FINAL_EVALUATION",
            BidStatus::Accepted => "ACCEPTED",
            BidStatus::Rejected => "REJECTED",
        }
    }

    pub const fn is_shortlisted(self) -> bool {
        matches!(self, BidStatus::Shortlisted)
    }

    /// Statuses the bidder hears about: shortlisting and the award outcome.
    pub const fn triggers_notification(self) -> bool {
        matches!(
            self,
            BidStatus::Shortlisted | BidStatus::Accepted | BidStatus::Rejected
        )
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderStatus {
    Draft,
    Published,
    Closed,
    Awarded,
    Cancelled,
}

impl TenderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TenderStatus::Draft => "DRAFT",
            TenderStatus::Published => "PUBLISHED",
            TenderStatus::Closed => "CLOSED",
            TenderStatus::Awarded => "AWARDED",
            TenderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Vendor supplied bid payload accepted at intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidSubmission {
    pub tender_id: TenderId,
    pub bidder_id: BidderId,
    pub bidder_name: String,
    pub amount: f64,
    #[serde(default)]
    pub technical_proposal: String,
}

/// Bid as held by the bid store, including the outcome of the latest evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRecord {
    pub bid_id: BidId,
    pub tender_id: TenderId,
    pub bidder_id: BidderId,
    pub bidder_name: String,
    pub amount: f64,
    pub technical_proposal: String,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_assessment: Option<StageAssessment>,
}

impl BidRecord {
    pub fn status_view(&self) -> BidStatusView {
        BidStatusView {
            bid_id: self.bid_id.clone(),
            tender_id: self.tender_id.clone(),
            bidder_name: self.bidder_name.clone(),
            status: self.status.label(),
            stage: self
                .last_assessment
                .as_ref()
                .map(|assessment| assessment.stage.as_str()),
            composite_score: self
                .last_assessment
                .as_ref()
                .map(|assessment| assessment.composite_score),
        }
    }

    pub(crate) fn composite_score(&self) -> Option<f64> {
        self.last_assessment
            .as_ref()
            .map(|assessment| assessment.composite_score)
    }
}

/// Sanitized representation of a bid's exposed status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidStatusView {
    pub bid_id: BidId,
    pub tender_id: TenderId,
    pub bidder_name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_score: Option<f64>,
}
