use etender::workflows::bids::{
    BidId, BidNotification, BidRecord, BidRepository, EvaluationLog, EvaluationLogEntry,
    NotificationDispatcher, NotificationError, RepositoryError, TenderId, TenderStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("in-memory store lock poisoned".to_string())
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBidRepository {
    bids: Arc<Mutex<HashMap<BidId, BidRecord>>>,
    tenders: Arc<Mutex<HashMap<TenderId, TenderStatus>>>,
}

impl InMemoryBidRepository {
    pub(crate) fn tender_status(&self, tender_id: &TenderId) -> Option<TenderStatus> {
        self.tenders
            .lock()
            .ok()
            .and_then(|guard| guard.get(tender_id).copied())
    }
}

impl BidRepository for InMemoryBidRepository {
    fn insert(&self, record: BidRecord) -> Result<BidRecord, RepositoryError> {
        let mut guard = self.bids.lock().map_err(poisoned)?;
        if guard.contains_key(&record.bid_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.bid_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: BidRecord) -> Result<(), RepositoryError> {
        let mut guard = self.bids.lock().map_err(poisoned)?;
        if guard.contains_key(&record.bid_id) {
            guard.insert(record.bid_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &BidId) -> Result<Option<BidRecord>, RepositoryError> {
        let guard = self.bids.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    fn for_tender(&self, tender_id: &TenderId) -> Result<Vec<BidRecord>, RepositoryError> {
        let guard = self.bids.lock().map_err(poisoned)?;
        let mut bids: Vec<BidRecord> = guard
            .values()
            .filter(|record| &record.tender_id == tender_id)
            .cloned()
            .collect();
        bids.sort_by(|left, right| right.submitted_at.cmp(&left.submitted_at));
        Ok(bids)
    }

    fn update_tender_status(
        &self,
        tender_id: &TenderId,
        status: TenderStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.tenders.lock().map_err(poisoned)?;
        guard.insert(tender_id.clone(), status);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationLog {
    entries: Arc<Mutex<Vec<EvaluationLogEntry>>>,
}

impl EvaluationLog for InMemoryEvaluationLog {
    fn append(&self, entry: EvaluationLogEntry) -> Result<EvaluationLogEntry, RepositoryError> {
        let mut guard = self.entries.lock().map_err(poisoned)?;
        guard.push(entry.clone());
        Ok(entry)
    }

    fn for_bid(&self, bid_id: &BidId) -> Result<Vec<EvaluationLogEntry>, RepositoryError> {
        let guard = self.entries.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|entry| &entry.bid_id == bid_id)
            .cloned()
            .collect())
    }
}

/// Keeps an outbox instead of sending mail; each dispatch is also logged.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationDispatcher {
    outbox: Arc<Mutex<Vec<BidNotification>>>,
}

impl NotificationDispatcher for InMemoryNotificationDispatcher {
    fn dispatch(&self, notification: BidNotification) -> Result<(), NotificationError> {
        info!(
            template = notification.kind.template(),
            bid_id = %notification.bid_id,
            bidder = notification.bidder_id.0,
            "bidder notification queued"
        );
        let mut guard = self
            .outbox
            .lock()
            .map_err(|_| NotificationError::Transport("outbox lock poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationDispatcher {
    pub(crate) fn outbox(&self) -> Vec<BidNotification> {
        self.outbox
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
