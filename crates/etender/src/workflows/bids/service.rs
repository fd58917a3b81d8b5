use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::WorkflowConfig;

use super::domain::{
    BidId, BidRecord, BidStatus, BidStatusView, BidSubmission, EvaluatorId, TenderId,
};
use super::evaluation::{evaluate, EvaluationStage, ScoreCard};
use super::repository::{
    BidNotification, BidRepository, EvaluationLog, EvaluationLogEntry, NotificationDispatcher,
    NotificationKind, RepositoryError,
};

/// Service composing the bid store, the evaluation log and bidder notifications around the
/// pure evaluation engine.
pub struct BidEvaluationService<R, L, N> {
    pub(super) repository: Arc<R>,
    pub(super) log: Arc<L>,
    pub(super) notifications: Arc<N>,
    config: WorkflowConfig,
}

static BID_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static LOG_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_bid_id() -> BidId {
    let id = BID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BidId(format!("bid-{id:06}"))
}

pub(super) fn next_entry_id() -> String {
    let id = LOG_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("eval-{id:06}")
}

/// One evaluator's scoring submission for a bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub evaluator_id: EvaluatorId,
    #[serde(flatten)]
    pub scores: ScoreCard,
    #[serde(default)]
    pub comments: Option<String>,
}

/// What the caller gets back from a successful evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReceipt {
    pub bid_id: BidId,
    pub tender_id: TenderId,
    pub entry_id: String,
    pub composite_score: f64,
    pub stage: EvaluationStage,
    pub status: BidStatus,
}

/// One page of a tender's shortlist, best composite first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistPage {
    pub bids: Vec<BidStatusView>,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
}

impl<R, L, N> BidEvaluationService<R, L, N>
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(repository: Arc<R>, log: Arc<L>, notifications: Arc<N>) -> Self {
        Self::with_config(repository, log, notifications, WorkflowConfig::default())
    }

    pub fn with_config(
        repository: Arc<R>,
        log: Arc<L>,
        notifications: Arc<N>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            repository,
            log,
            notifications,
            config,
        }
    }

    /// Accept a vendor bid. New bids start `Pending` until an evaluator scores them.
    pub fn submit(&self, submission: BidSubmission) -> Result<BidRecord, BidServiceError> {
        if submission.tender_id.0.trim().is_empty() {
            return Err(ValidationError::MissingTender.into());
        }
        if !submission.amount.is_finite() || submission.amount <= 0.0 {
            return Err(ValidationError::InvalidAmount(submission.amount).into());
        }

        let now = Utc::now();
        let record = BidRecord {
            bid_id: next_bid_id(),
            tender_id: submission.tender_id,
            bidder_id: submission.bidder_id,
            bidder_name: submission.bidder_name,
            amount: submission.amount,
            technical_proposal: submission.technical_proposal,
            status: BidStatus::Pending,
            submitted_at: now,
            updated_at: now,
            last_assessment: None,
        };

        let stored = self.repository.insert(record)?;
        info!(bid_id = %stored.bid_id, tender_id = %stored.tender_id, "bid submitted");
        Ok(stored)
    }

    /// Score a bid, persist the resulting status and append one log entry.
    ///
    /// Each pass recomputes from the submitted scores alone; a lower score than a previous
    /// pass moves the bid back down.
    pub fn evaluate(
        &self,
        bid_id: &BidId,
        request: EvaluationRequest,
    ) -> Result<EvaluationReceipt, BidServiceError> {
        validate_scores(&request.scores)?;

        let mut record = self
            .repository
            .fetch(bid_id)?
            .ok_or(RepositoryError::NotFound)?;

        let already_evaluated = self
            .log
            .for_bid(bid_id)?
            .iter()
            .any(|entry| entry.evaluator_id == request.evaluator_id);
        if already_evaluated {
            return Err(BidServiceError::AlreadyEvaluated {
                bid_id: bid_id.clone(),
                evaluator_id: request.evaluator_id,
            });
        }

        let assessment = evaluate(&request.scores);
        let now = Utc::now();
        let previous = record.clone();

        record.status = assessment.status;
        record.last_assessment = Some(assessment);
        record.updated_at = now;
        self.repository.update(record.clone())?;

        let appended = self.log.append(EvaluationLogEntry {
            entry_id: next_entry_id(),
            bid_id: record.bid_id.clone(),
            tender_id: record.tender_id.clone(),
            evaluator_id: request.evaluator_id,
            scores: Some(request.scores),
            composite_score: assessment.composite_score,
            stage: assessment.stage,
            status: assessment.status,
            comments: request.comments.unwrap_or_default(),
            recorded_at: now,
        });
        let entry = match appended {
            Ok(entry) => entry,
            Err(err) => {
                // A status is never left behind without its log entry.
                self.restore(std::slice::from_ref(&previous));
                return Err(err.into());
            }
        };

        info!(
            bid_id = %record.bid_id,
            evaluator = request.evaluator_id.0,
            composite = assessment.composite_score,
            stage = %assessment.stage,
            status = %assessment.status,
            "bid evaluated"
        );

        if assessment.status.triggers_notification() {
            self.notify(BidNotification::for_bid(
                NotificationKind::BidShortlisted,
                &record,
            ));
        }

        Ok(EvaluationReceipt {
            bid_id: record.bid_id,
            tender_id: record.tender_id,
            entry_id: entry.entry_id,
            composite_score: assessment.composite_score,
            stage: assessment.stage,
            status: assessment.status,
        })
    }

    pub fn get(&self, bid_id: &BidId) -> Result<BidRecord, BidServiceError> {
        let record = self
            .repository
            .fetch(bid_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Evaluation log for a bid, oldest first.
    pub fn history(&self, bid_id: &BidId) -> Result<Vec<EvaluationLogEntry>, BidServiceError> {
        if self.repository.fetch(bid_id)?.is_none() {
            return Err(RepositoryError::NotFound.into());
        }
        Ok(self.log.for_bid(bid_id)?)
    }

    /// Bids of a tender currently `Shortlisted`, ordered by composite score (desc) then id.
    ///
    /// `page` is 1-based; zero is treated as the first page.
    pub fn shortlist(
        &self,
        tender_id: &TenderId,
        page: usize,
        page_size: Option<usize>,
    ) -> Result<ShortlistPage, BidServiceError> {
        let page_size = page_size
            .filter(|size| *size > 0)
            .unwrap_or(self.config.shortlist_page_size);
        let current_page = page.max(1);

        let mut shortlisted: Vec<BidRecord> = self
            .repository
            .for_tender(tender_id)?
            .into_iter()
            .filter(|record| record.status.is_shortlisted())
            .collect();
        shortlisted.sort_by(|left, right| {
            let left_score = left.composite_score().unwrap_or(f64::NEG_INFINITY);
            let right_score = right.composite_score().unwrap_or(f64::NEG_INFINITY);
            right_score
                .total_cmp(&left_score)
                .then_with(|| left.bid_id.cmp(&right.bid_id))
        });

        let total_count = shortlisted.len();
        let total_pages = total_count.div_ceil(page_size);
        let bids = shortlisted
            .iter()
            .skip((current_page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(BidRecord::status_view)
            .collect();

        Ok(ShortlistPage {
            bids,
            total_count,
            total_pages,
            current_page,
            page_size,
        })
    }

    /// Put records back the way they were fetched after a later write in the same pass failed.
    pub(super) fn restore(&self, records: &[BidRecord]) {
        for record in records {
            if let Err(err) = self.repository.update(record.clone()) {
                warn!(
                    bid_id = %record.bid_id,
                    error = %err,
                    "failed to restore bid after aborted write"
                );
            }
        }
    }

    /// Fire-and-forget: a failed dispatch is logged and never undoes the status write.
    pub(super) fn notify(&self, notification: BidNotification) {
        let kind = notification.kind;
        let bid_id = notification.bid_id.clone();
        if let Err(err) = self.notifications.dispatch(notification) {
            warn!(%bid_id, template = kind.template(), error = %err, "bidder notification failed");
        }
    }
}

fn validate_scores(scores: &ScoreCard) -> Result<(), ValidationError> {
    let fields = [
        ("technicalScore", scores.technical_score),
        ("financialScore", scores.financial_score),
        ("experienceScore", scores.experience_score),
    ];

    for (field, value) in fields {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::ScoreOutOfRange { field, value });
        }
    }
    Ok(())
}

/// Caller-side input checks; the evaluation engine itself accepts anything.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be between 0 and 100 (found {value})")]
    ScoreOutOfRange { field: &'static str, value: f64 },
    #[error("bid amount must be a positive number (found {0})")]
    InvalidAmount(f64),
    #[error("bid must reference a tender")]
    MissingTender,
    #[error("bid {bid_id} does not belong to tender {tender_id}")]
    BidNotInTender { bid_id: BidId, tender_id: TenderId },
}

/// Error raised by the bid evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum BidServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("bid {bid_id} has already been evaluated by evaluator {evaluator_id}")]
    AlreadyEvaluated {
        bid_id: BidId,
        evaluator_id: EvaluatorId,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl BidServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BidServiceError::Validation(ValidationError::ScoreOutOfRange { .. }) => {
                StatusCode::BAD_REQUEST
            }
            BidServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BidServiceError::AlreadyEvaluated { .. }
            | BidServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            BidServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            BidServiceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
