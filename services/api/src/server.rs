use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryBidRepository, InMemoryEvaluationLog, InMemoryNotificationDispatcher,
};
use crate::routes::with_bid_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use etender::config::AppConfig;
use etender::error::AppError;
use etender::telemetry;
use etender::workflows::bids::BidEvaluationService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(BidEvaluationService::with_config(
        Arc::new(InMemoryBidRepository::default()),
        Arc::new(InMemoryEvaluationLog::default()),
        Arc::new(InMemoryNotificationDispatcher::default()),
        config.workflow,
    ));

    let app = with_bid_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        shortlist_page_size = config.workflow.shortlist_page_size,
        "bid evaluation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
