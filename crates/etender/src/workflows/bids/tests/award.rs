use std::sync::Arc;

use super::common::*;
use crate::workflows::bids::domain::{BidId, BidStatus, EvaluatorId, TenderId, TenderStatus};
use crate::workflows::bids::evaluation::EvaluationStage;
use crate::workflows::bids::repository::{BidRepository, NotificationKind, RepositoryError};
use crate::workflows::bids::{AwardRequest, BidEvaluationService, BidServiceError, ValidationError};

fn seeded_tender(service: &MemoryService) -> Vec<BidId> {
    let tender_id = tender();
    [(1, 82.0), (2, 74.0), (3, 55.0)]
        .into_iter()
        .map(|(bidder, score)| {
            let record = service
                .submit(submission_for(&tender_id, bidder, &format!("Vendor {bidder}")))
                .expect("submission succeeds");
            service
                .evaluate(&record.bid_id, request(5, score, score, score))
                .expect("evaluation succeeds");
            record.bid_id
        })
        .collect()
}

#[test]
fn award_accepts_winner_and_rejects_the_rest() {
    let (service, repository, log, notifications) = build_service();
    let ids = seeded_tender(&service);
    let before = notifications.events().len();

    let outcome = service
        .award(
            &tender(),
            AwardRequest {
                evaluator_id: EvaluatorId(99),
                winning_bid_id: ids[1].clone(),
            },
        )
        .expect("award succeeds");

    assert_eq!(outcome.winning_bid_id, ids[1]);
    assert_eq!(outcome.rejected_count, 2);
    assert_eq!(repository.tender_status(&tender()), Some(TenderStatus::Awarded));

    for (index, id) in ids.iter().enumerate() {
        let stored = repository
            .fetch(id)
            .expect("fetch succeeds")
            .expect("record present");
        let expected = if index == 1 {
            BidStatus::Accepted
        } else {
            BidStatus::Rejected
        };
        assert_eq!(stored.status, expected, "bid {id}");
    }

    let award_entry = log
        .entries()
        .into_iter()
        .find(|entry| entry.evaluator_id == EvaluatorId(99))
        .expect("award logged");
    assert_eq!(award_entry.bid_id, ids[1]);
    assert_eq!(award_entry.stage, EvaluationStage::Final);
    assert_eq!(award_entry.status, BidStatus::Accepted);
    assert_eq!(award_entry.composite_score, 100.0);
    assert!(award_entry.scores.is_none());

    let events = notifications.events();
    let award_events = &events[before..];
    assert_eq!(award_events.len(), 3);
    assert_eq!(
        award_events
            .iter()
            .filter(|event| event.kind == NotificationKind::BidAwarded)
            .count(),
        1
    );
    assert_eq!(
        award_events
            .iter()
            .filter(|event| event.kind == NotificationKind::BidRejected)
            .count(),
        2
    );
}

#[test]
fn award_requires_winner_from_the_same_tender() {
    let (service, repository, _, _) = build_service();
    seeded_tender(&service);
    let other_tender = TenderId("tender-bridges-2025".to_string());
    let stray = service
        .submit(submission_for(&other_tender, 8, "Stray Bidder"))
        .expect("submission succeeds");

    match service.award(
        &tender(),
        AwardRequest {
            evaluator_id: EvaluatorId(99),
            winning_bid_id: stray.bid_id.clone(),
        },
    ) {
        Err(BidServiceError::Validation(ValidationError::BidNotInTender { bid_id, .. })) => {
            assert_eq!(bid_id, stray.bid_id);
        }
        other => panic!("expected tender mismatch, got {other:?}"),
    }
    assert_eq!(repository.tender_status(&tender()), None);
}

#[test]
fn award_for_unknown_bid_is_not_found() {
    let (service, _, _, _) = build_service();
    match service.award(
        &tender(),
        AwardRequest {
            evaluator_id: EvaluatorId(99),
            winning_bid_id: BidId("bid-missing".to_string()),
        },
    ) {
        Err(BidServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn award_survives_notification_outage() {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(OfflineNotifications::default());
    let service = BidEvaluationService::new(
        repository.clone(),
        Arc::new(MemoryLog::default()),
        notifications.clone(),
    );
    let tender_id = tender();
    let winner = service
        .submit(submission_for(&tender_id, 1, "Only Vendor"))
        .expect("submission succeeds");

    let outcome = service
        .award(
            &tender_id,
            AwardRequest {
                evaluator_id: EvaluatorId(99),
                winning_bid_id: winner.bid_id.clone(),
            },
        )
        .expect("award succeeds");

    assert_eq!(outcome.rejected_count, 0);
    assert_eq!(notifications.attempts(), 1);
    let stored = repository
        .fetch(&winner.bid_id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.status, BidStatus::Accepted);
}

fn flaky_service() -> (
    BidEvaluationService<FlakyRepository, MemoryLog, MemoryNotifications>,
    Arc<FlakyRepository>,
    Arc<MemoryNotifications>,
    Vec<(BidId, BidStatus)>,
) {
    let repository = Arc::new(FlakyRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = BidEvaluationService::new(
        repository.clone(),
        Arc::new(MemoryLog::default()),
        notifications.clone(),
    );
    let tender_id = tender();
    let before = [(1, 82.0), (2, 74.0), (3, 55.0)]
        .into_iter()
        .map(|(bidder, score)| {
            let record = service
                .submit(submission_for(&tender_id, bidder, &format!("Vendor {bidder}")))
                .expect("submission succeeds");
            let receipt = service
                .evaluate(&record.bid_id, request(5, score, score, score))
                .expect("evaluation succeeds");
            (record.bid_id, receipt.status)
        })
        .collect();
    (service, repository, notifications, before)
}

fn assert_untouched(repository: &FlakyRepository, before: &[(BidId, BidStatus)]) {
    for (id, status) in before {
        let stored = repository
            .fetch(id)
            .expect("fetch succeeds")
            .expect("record present");
        assert_eq!(stored.status, *status, "bid {id}");
    }
    assert_eq!(repository.inner.tender_status(&tender()), None);
}

#[test]
fn award_restores_bids_when_a_status_write_fails_midway() {
    let (service, repository, notifications, before) = flaky_service();
    let notified = notifications.events().len();
    repository.fail_update_after(1);

    match service.award(
        &tender(),
        AwardRequest {
            evaluator_id: EvaluatorId(99),
            winning_bid_id: before[1].0.clone(),
        },
    ) {
        Err(BidServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected write failure, got {other:?}"),
    }

    assert_untouched(&repository, &before);
    assert_eq!(notifications.events().len(), notified);
}

#[test]
fn award_restores_bids_when_the_tender_cannot_be_closed() {
    let (service, repository, notifications, before) = flaky_service();
    let notified = notifications.events().len();
    repository.fail_tender_status();

    assert!(service
        .award(
            &tender(),
            AwardRequest {
                evaluator_id: EvaluatorId(99),
                winning_bid_id: before[0].0.clone(),
            },
        )
        .is_err());

    assert_untouched(&repository, &before);
    assert_eq!(notifications.events().len(), notified);
}
