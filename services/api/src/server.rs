use crate::cli::ServeArgs;
use crate::infra::{seed_directory, AppState, LoggingNotifier};
use crate::routes::with_case_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use caseflow::config::AppConfig;
use caseflow::error::AppError;
use caseflow::matching::{AssignmentService, InMemoryAssignmentStore};
use caseflow::telemetry;
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

    let directory = seed_directory();
    let directory_size = directory.len();
    let store = Arc::new(InMemoryAssignmentStore::with_lawyers(directory));
    let service = Arc::new(AssignmentService::new(
        store,
        Arc::new(LoggingNotifier),
        config.matching.clone(),
    ));

    let app = with_case_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        lawyers = directory_size,
        min_score = config.matching.min_score,
        "case assignment service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
