use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{BidId, BidRecord, BidStatus, EvaluatorId, TenderId, TenderStatus};
use super::evaluation::EvaluationStage;
use super::repository::{
    BidNotification, BidRepository, EvaluationLog, EvaluationLogEntry, NotificationDispatcher,
    NotificationKind, RepositoryError,
};
use super::service::{next_entry_id, BidEvaluationService, BidServiceError, ValidationError};

const AWARD_SCORE: f64 = 100.0;
const AWARD_COMMENT: &str = "Final bid evaluation for tender award";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRequest {
    pub evaluator_id: EvaluatorId,
    pub winning_bid_id: BidId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardOutcome {
    pub tender_id: TenderId,
    pub winning_bid_id: BidId,
    pub rejected_count: usize,
}

impl<R, L, N> BidEvaluationService<R, L, N>
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    /// Close out a tender: the winner becomes `Accepted`, every other bid `Rejected`.
    pub fn award(
        &self,
        tender_id: &TenderId,
        request: AwardRequest,
    ) -> Result<AwardOutcome, BidServiceError> {
        let winner = self
            .repository
            .fetch(&request.winning_bid_id)?
            .ok_or(RepositoryError::NotFound)?;
        if &winner.tender_id != tender_id {
            return Err(ValidationError::BidNotInTender {
                bid_id: winner.bid_id,
                tender_id: tender_id.clone(),
            }
            .into());
        }

        let mut originals = self.repository.for_tender(tender_id)?;
        if !originals.iter().any(|record| record.bid_id == winner.bid_id) {
            // The store listed the tender without the winner; settle it with the rest.
            originals.push(winner.clone());
        }

        let now = Utc::now();
        let settled: Vec<BidRecord> = originals
            .iter()
            .cloned()
            .map(|mut record| {
                record.status = if record.bid_id == winner.bid_id {
                    BidStatus::Accepted
                } else {
                    BidStatus::Rejected
                };
                record.updated_at = now;
                record
            })
            .collect();

        // Logged first: if a later write fails the bids are restored, and the entry stays
        // behind as the record of the aborted award.
        self.log.append(EvaluationLogEntry {
            entry_id: next_entry_id(),
            bid_id: winner.bid_id.clone(),
            tender_id: tender_id.clone(),
            evaluator_id: request.evaluator_id,
            scores: None,
            composite_score: AWARD_SCORE,
            stage: EvaluationStage::Final,
            status: BidStatus::Accepted,
            comments: AWARD_COMMENT.to_string(),
            recorded_at: now,
        })?;

        for (written, record) in settled.iter().enumerate() {
            if let Err(err) = self.repository.update(record.clone()) {
                self.restore(&originals[..written]);
                return Err(err.into());
            }
        }

        if let Err(err) = self
            .repository
            .update_tender_status(tender_id, TenderStatus::Awarded)
        {
            self.restore(&originals);
            return Err(err.into());
        }

        let (awarded, rejected): (Vec<BidRecord>, Vec<BidRecord>) = settled
            .into_iter()
            .partition(|record| record.status == BidStatus::Accepted);
        let Some(awarded) = awarded.into_iter().next() else {
            return Err(RepositoryError::NotFound.into());
        };

        info!(
            %tender_id,
            winning_bid = %awarded.bid_id,
            rejected = rejected.len(),
            "tender awarded"
        );

        self.notify(BidNotification::for_bid(
            NotificationKind::BidAwarded,
            &awarded,
        ));
        for record in &rejected {
            self.notify(BidNotification::for_bid(NotificationKind::BidRejected, record));
        }

        Ok(AwardOutcome {
            tender_id: tender_id.clone(),
            winning_bid_id: awarded.bid_id,
            rejected_count: rejected.len(),
        })
    }
}
