use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::bids::domain::{
    BidId, BidRecord, BidSubmission, BidderId, EvaluatorId, TenderId, TenderStatus,
};
use crate::workflows::bids::evaluation::ScoreCard;
use crate::workflows::bids::repository::{
    BidNotification, BidRepository, EvaluationLog, EvaluationLogEntry, NotificationDispatcher,
    NotificationError, RepositoryError,
};
use crate::workflows::bids::{bid_router, BidEvaluationService, EvaluationRequest};

pub(super) type MemoryService =
    BidEvaluationService<MemoryRepository, MemoryLog, MemoryNotifications>;

pub(super) fn tender() -> TenderId {
    TenderId("tender-roads-2025".to_string())
}

pub(super) fn submission() -> BidSubmission {
    submission_for(&tender(), 41, "Harbor Civil Works")
}

pub(super) fn submission_for(tender_id: &TenderId, bidder: u64, name: &str) -> BidSubmission {
    BidSubmission {
        tender_id: tender_id.clone(),
        bidder_id: BidderId(bidder),
        bidder_name: name.to_string(),
        amount: 1_250_000.0,
        technical_proposal: "Resurface 12km of arterial road in two phases".to_string(),
    }
}

pub(super) fn request(
    evaluator: u64,
    technical: f64,
    financial: f64,
    experience: f64,
) -> EvaluationRequest {
    EvaluationRequest {
        evaluator_id: EvaluatorId(evaluator),
        scores: ScoreCard::new(technical, financial, experience),
        comments: Some("scored against published criteria".to_string()),
    }
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryRepository>,
    Arc<MemoryLog>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let log = Arc::new(MemoryLog::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service =
        BidEvaluationService::new(repository.clone(), log.clone(), notifications.clone());
    (service, repository, log, notifications)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) bids: Arc<Mutex<HashMap<BidId, BidRecord>>>,
    pub(super) tenders: Arc<Mutex<HashMap<TenderId, TenderStatus>>>,
}

impl MemoryRepository {
    pub(super) fn tender_status(&self, tender_id: &TenderId) -> Option<TenderStatus> {
        self.tenders
            .lock()
            .expect("tender mutex poisoned")
            .get(tender_id)
            .copied()
    }
}

impl BidRepository for MemoryRepository {
    fn insert(&self, record: BidRecord) -> Result<BidRecord, RepositoryError> {
        let mut guard = self.bids.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.bid_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.bid_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: BidRecord) -> Result<(), RepositoryError> {
        let mut guard = self.bids.lock().expect("repository mutex poisoned");
        guard.insert(record.bid_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &BidId) -> Result<Option<BidRecord>, RepositoryError> {
        let guard = self.bids.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_tender(&self, tender_id: &TenderId) -> Result<Vec<BidRecord>, RepositoryError> {
        let guard = self.bids.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.tender_id == tender_id)
            .cloned()
            .collect())
    }

    fn update_tender_status(
        &self,
        tender_id: &TenderId,
        status: TenderStatus,
    ) -> Result<(), RepositoryError> {
        self.tenders
            .lock()
            .expect("tender mutex poisoned")
            .insert(tender_id.clone(), status);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryLog {
    entries: Arc<Mutex<Vec<EvaluationLogEntry>>>,
}

impl MemoryLog {
    pub(super) fn entries(&self) -> Vec<EvaluationLogEntry> {
        self.entries.lock().expect("log mutex poisoned").clone()
    }
}

impl EvaluationLog for MemoryLog {
    fn append(&self, entry: EvaluationLogEntry) -> Result<EvaluationLogEntry, RepositoryError> {
        self.entries
            .lock()
            .expect("log mutex poisoned")
            .push(entry.clone());
        Ok(entry)
    }

    fn for_bid(&self, bid_id: &BidId) -> Result<Vec<EvaluationLogEntry>, RepositoryError> {
        Ok(self
            .entries
            .lock()
            .expect("log mutex poisoned")
            .iter()
            .filter(|entry| &entry.bid_id == bid_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<BidNotification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<BidNotification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationDispatcher for MemoryNotifications {
    fn dispatch(&self, notification: BidNotification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Counts attempts but always fails, like a mail relay that is down.
#[derive(Default)]
pub(super) struct OfflineNotifications {
    attempts: Mutex<usize>,
}

impl OfflineNotifications {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("notification mutex poisoned")
    }
}

impl NotificationDispatcher for OfflineNotifications {
    fn dispatch(&self, _notification: BidNotification) -> Result<(), NotificationError> {
        *self.attempts.lock().expect("notification mutex poisoned") += 1;
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

/// Reads work, but every append is refused, like an audit table that lost its connection.
#[derive(Default)]
pub(super) struct ReadOnlyLog;

impl EvaluationLog for ReadOnlyLog {
    fn append(&self, _entry: EvaluationLogEntry) -> Result<EvaluationLogEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("evaluation log is read-only".to_string()))
    }

    fn for_bid(&self, _bid_id: &BidId) -> Result<Vec<EvaluationLogEntry>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Memory repository that can be armed to fail one upcoming write.
#[derive(Default)]
pub(super) struct FlakyRepository {
    pub(super) inner: MemoryRepository,
    updates_before_failure: Mutex<Option<usize>>,
    fail_tender_status: Mutex<bool>,
}

impl FlakyRepository {
    /// Let `successes` bid updates through, then fail the next one. Later updates succeed.
    pub(super) fn fail_update_after(&self, successes: usize) {
        *self
            .updates_before_failure
            .lock()
            .expect("flaky mutex poisoned") = Some(successes);
    }

    pub(super) fn fail_tender_status(&self) {
        *self.fail_tender_status.lock().expect("flaky mutex poisoned") = true;
    }
}

impl BidRepository for FlakyRepository {
    fn insert(&self, record: BidRecord) -> Result<BidRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: BidRecord) -> Result<(), RepositoryError> {
        {
            let mut armed = self
                .updates_before_failure
                .lock()
                .expect("flaky mutex poisoned");
            match *armed {
                Some(0) => {
                    *armed = None;
                    return Err(RepositoryError::Unavailable("write timed out".to_string()));
                }
                Some(remaining) => *armed = Some(remaining - 1),
                None => {}
            }
        }
        self.inner.update(record)
    }

    fn fetch(&self, id: &BidId) -> Result<Option<BidRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn for_tender(&self, tender_id: &TenderId) -> Result<Vec<BidRecord>, RepositoryError> {
        self.inner.for_tender(tender_id)
    }

    fn update_tender_status(
        &self,
        tender_id: &TenderId,
        status: TenderStatus,
    ) -> Result<(), RepositoryError> {
        if *self.fail_tender_status.lock().expect("flaky mutex poisoned") {
            return Err(RepositoryError::Unavailable("tender table locked".to_string()));
        }
        self.inner.update_tender_status(tender_id, status)
    }
}

pub(super) struct UnavailableRepository;

impl BidRepository for UnavailableRepository {
    fn insert(&self, _record: BidRecord) -> Result<BidRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: BidRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &BidId) -> Result<Option<BidRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_tender(&self, _tender_id: &TenderId) -> Result<Vec<BidRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_tender_status(
        &self,
        _tender_id: &TenderId,
        _status: TenderStatus,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    bid_router(Arc::new(service))
}
