use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::award::AwardRequest;
use super::domain::{BidId, BidSubmission, TenderId};
use super::evaluation::{evaluate, ScoreCard};
use super::repository::{BidRepository, EvaluationLog, NotificationDispatcher};
use super::service::{BidEvaluationService, BidServiceError, EvaluationRequest};

/// Router builder exposing bid intake, evaluation, shortlist and award endpoints.
pub fn bid_router<R, L, N>(service: Arc<BidEvaluationService<R, L, N>>) -> Router
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/bids", post(submit_handler::<R, L, N>))
        .route("/api/v1/bids/:bid_id", get(status_handler::<R, L, N>))
        .route(
            "/api/v1/bids/:bid_id/evaluations",
            post(evaluate_handler::<R, L, N>).get(history_handler::<R, L, N>),
        )
        .route(
            "/api/v1/tenders/:tender_id/shortlist",
            get(shortlist_handler::<R, L, N>),
        )
        .route(
            "/api/v1/tenders/:tender_id/award",
            post(award_handler::<R, L, N>),
        )
        .route("/api/v1/evaluation/classify", post(classify_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ShortlistQuery {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    page_size: Option<usize>,
}

fn error_response(error: BidServiceError) -> Response {
    let status = error.status_code();
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R, L, N>(
    State(service): State<Arc<BidEvaluationService<R, L, N>>>,
    Json(submission): Json<BidSubmission>,
) -> Response
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.submit(submission) {
        Ok(record) => (StatusCode::ACCEPTED, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, L, N>(
    State(service): State<Arc<BidEvaluationService<R, L, N>>>,
    Path(bid_id): Path<String>,
) -> Response
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.get(&BidId(bid_id)) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler<R, L, N>(
    State(service): State<Arc<BidEvaluationService<R, L, N>>>,
    Path(bid_id): Path<String>,
    Json(request): Json<EvaluationRequest>,
) -> Response
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.evaluate(&BidId(bid_id), request) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<R, L, N>(
    State(service): State<Arc<BidEvaluationService<R, L, N>>>,
    Path(bid_id): Path<String>,
) -> Response
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.history(&BidId(bid_id)) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn shortlist_handler<R, L, N>(
    State(service): State<Arc<BidEvaluationService<R, L, N>>>,
    Path(tender_id): Path<String>,
    Query(query): Query<ShortlistQuery>,
) -> Response
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    let page = query.page.unwrap_or(1);
    match service.shortlist(&TenderId(tender_id), page, query.page_size) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn award_handler<R, L, N>(
    State(service): State<Arc<BidEvaluationService<R, L, N>>>,
    Path(tender_id): Path<String>,
    Json(request): Json<AwardRequest>,
) -> Response
where
    R: BidRepository + 'static,
    L: EvaluationLog + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.award(&TenderId(tender_id), request) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Stateless preview of the engine: no validation, no persistence.
pub(crate) async fn classify_handler(Json(scores): Json<ScoreCard>) -> Response {
    (StatusCode::OK, Json(evaluate(&scores))).into_response()
}
