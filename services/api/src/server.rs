use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_document_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use expiry_reminder::config::AppConfig;
use expiry_reminder::error::AppError;
use expiry_reminder::telemetry::{self, LogTarget};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs, database: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, LogTarget::Stdout)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let document_service = Arc::new(build_service(&mut config, database)?);
    let reminders_enabled = document_service.reminders_enabled();

    let app = with_document_routes(document_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.registry.database_path.display(),
        approaching_days = config.registry.approaching_days,
        reminders_enabled,
        "document expiry reminder ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
