use chrono::{Local, NaiveDate};
use expiry_reminder::config::{AppConfig, ReminderConfig};
use expiry_reminder::error::AppError;
use expiry_reminder::workflows::documents::{
    DocumentService, ReminderDelivery, ReminderDispatcher, SmtpMailer, SqliteDocumentRegistry,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn resolve_today(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

/// Applies the `--database` override and opens (initializing) the registry.
pub(crate) fn open_registry(
    config: &mut AppConfig,
    database: Option<PathBuf>,
) -> Result<Arc<SqliteDocumentRegistry>, AppError> {
    if let Some(path) = database {
        config.registry.database_path = path;
    }
    let registry = SqliteDocumentRegistry::open(config.registry.database_path.clone())?;
    Ok(Arc::new(registry))
}

/// SMTP-backed delivery, or `None` when no sender account is configured.
pub(crate) fn reminder_delivery(
    reminders: &ReminderConfig,
) -> Result<Option<ReminderDelivery>, AppError> {
    let Some(settings) = reminders.smtp_settings() else {
        return Ok(None);
    };
    let from = reminders
        .from_address
        .clone()
        .unwrap_or_else(|| settings.credentials.username().to_string());

    let mailer = SmtpMailer::new(settings)?;
    let dispatcher = ReminderDispatcher::new(from, reminders.failure_policy);
    Ok(Some(ReminderDelivery::new(dispatcher, Arc::new(mailer))))
}

pub(crate) fn build_service(
    config: &mut AppConfig,
    database: Option<PathBuf>,
) -> Result<DocumentService<SqliteDocumentRegistry>, AppError> {
    let registry = open_registry(config, database)?;
    let service = DocumentService::new(registry, config.registry.approaching_days);

    match reminder_delivery(&config.reminders)? {
        Some(delivery) => Ok(service.with_delivery(delivery)),
        None => {
            warn!("SMTP credentials not configured; reminder dispatch disabled");
            Ok(service)
        }
    }
}
