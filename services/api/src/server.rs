use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryReportStore, InMemoryUploadStore, LoggingNotifier};
use crate::routes::with_readiness_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use invoice_readiness::config::AppConfig;
use invoice_readiness::error::AppError;
use invoice_readiness::telemetry;
use invoice_readiness::workflows::readiness::ReadinessService;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let share_base_url = config.public_base_url();
    let readiness_service = Arc::new(ReadinessService::new(
        Arc::new(InMemoryUploadStore::default()),
        Arc::new(InMemoryReportStore::default()),
        Arc::new(LoggingNotifier::new(config.sharing.email_from.clone())),
        config.intake.clone(),
        share_base_url.clone(),
    ));

    let app = with_readiness_routes(readiness_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        share_base_url = %share_base_url,
        max_upload_bytes = config.intake.max_upload_bytes,
        default_country = %config.intake.default_country,
        "invoice readiness service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
