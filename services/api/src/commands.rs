use crate::infra::{open_registry, reminder_delivery, resolve_today};
use chrono::NaiveDate;
use clap::Args;
use expiry_reminder::config::AppConfig;
use expiry_reminder::error::AppError;
use expiry_reminder::telemetry::{self, LogTarget};
use expiry_reminder::workflows::documents::{
    cutoff, DispatchReport, Document, DocumentId, DocumentService, DocumentServiceError,
    ExpiryOverview, FailurePolicy, NewDocument, ReminderStatus, SqliteDocumentRegistry,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AddArgs {
    /// Document name
    #[arg(long)]
    pub(crate) name: String,
    /// Expiry date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) expiry_date: NaiveDate,
    /// Stored PDF file reference
    #[arg(long = "file")]
    pub(crate) file_path: Option<String>,
    /// Address to notify when the document nears expiry
    #[arg(long)]
    pub(crate) recipient: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct DeleteArgs {
    /// Identifier printed by `add` or `list`
    pub(crate) id: i64,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OverviewArgs {
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExpiringArgs {
    /// Window in days; 0 lists expired documents only (defaults to the configured window)
    #[arg(long)]
    pub(crate) within: Option<u32>,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RemindArgs {
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Sender account (overrides SMTP_USERNAME)
    #[arg(long, requires = "sender_password")]
    pub(crate) sender_email: Option<String>,
    /// Sender password (overrides SMTP_PASSWORD)
    #[arg(long, requires = "sender_email")]
    pub(crate) sender_password: Option<String>,
    /// Stop at the first transport failure instead of continuing
    #[arg(long)]
    pub(crate) abort_on_error: bool,
}

fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogTarget::Stderr)?;
    Ok(config)
}

fn open_service(
    config: &mut AppConfig,
    database: Option<PathBuf>,
) -> Result<DocumentService<SqliteDocumentRegistry>, AppError> {
    let registry = open_registry(config, database)?;
    Ok(DocumentService::new(
        registry,
        config.registry.approaching_days,
    ))
}

pub(crate) fn run_init(database: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = load_config()?;
    let registry = open_registry(&mut config, database)?;
    println!("Registry ready at {}", registry.path().display());
    Ok(())
}

pub(crate) fn run_add(args: AddArgs, database: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = load_config()?;
    let service = open_service(&mut config, database)?;

    let stored = service.register(NewDocument {
        name: args.name,
        expiry_date: args.expiry_date,
        file_path: args.file_path,
        recipient_email: args.recipient,
    })?;

    println!(
        "Document added successfully! #{} {} (expires {})",
        stored.id, stored.name, stored.expiry_date
    );
    Ok(())
}

pub(crate) fn run_list(args: OverviewArgs, database: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = load_config()?;
    let service = open_service(&mut config, database)?;
    let overview = service.overview(resolve_today(args.today))?;

    println!("All Documents (evaluated {})", overview.today);
    if overview.documents.is_empty() {
        println!("- none");
    }
    for view in &overview.documents {
        println!(
            "- #{} {} - Expiry Date: {} [{}]{}",
            view.document.id,
            view.document.name,
            view.document.expiry_date,
            view.status_label,
            describe_extras(&view.document)
        );
    }
    Ok(())
}

pub(crate) fn run_delete(args: DeleteArgs, database: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = load_config()?;
    let service = open_service(&mut config, database)?;
    let id = DocumentId(args.id);

    if service.remove(id)? {
        println!("Document #{id} deleted successfully!");
    } else {
        println!("No document #{id}; nothing deleted.");
    }
    Ok(())
}

pub(crate) fn run_expiring(args: ExpiringArgs, database: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = load_config()?;
    let service = open_service(&mut config, database)?;
    let today = resolve_today(args.today);
    let within = args.within.unwrap_or(config.registry.approaching_days);

    let documents = service.expiring_within(today, within)?;
    println!(
        "Documents expiring on or before {} ({} day window from {})",
        cutoff(today, within),
        within,
        today
    );
    render_documents(&documents);
    Ok(())
}

pub(crate) fn run_overview(args: OverviewArgs, database: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = load_config()?;
    let service = open_service(&mut config, database)?;
    let overview = service.overview(resolve_today(args.today))?;
    render_overview(&overview);
    Ok(())
}

pub(crate) fn run_remind(args: RemindArgs, database: Option<PathBuf>) -> Result<(), AppError> {
    let mut config = load_config()?;
    let RemindArgs {
        today,
        sender_email,
        sender_password,
        abort_on_error,
    } = args;

    if let (Some(email), Some(password)) = (sender_email, sender_password) {
        config.reminders = config.reminders.with_sender(email, password);
    }
    if abort_on_error {
        config.reminders.failure_policy = FailurePolicy::Abort;
    }

    let delivery =
        reminder_delivery(&config.reminders)?.ok_or(DocumentServiceError::RemindersDisabled)?;
    let service = open_service(&mut config, database)?.with_delivery(delivery);

    let today = resolve_today(today);
    let report = service.dispatch_reminders(today)?;
    render_dispatch(&report);
    Ok(())
}

fn describe_extras(document: &Document) -> String {
    let mut extras = String::new();
    if let Some(path) = &document.file_path {
        extras.push_str(&format!(" file {path}"));
    }
    if let Some(recipient) = document.recipient() {
        extras.push_str(&format!(" notify {recipient}"));
    }
    extras
}

fn render_documents(documents: &[Document]) {
    if documents.is_empty() {
        println!("- none");
        return;
    }
    for document in documents {
        println!(
            "- #{} {} - Expiry Date: {}",
            document.id, document.name, document.expiry_date
        );
    }
}

fn render_overview(overview: &ExpiryOverview) {
    println!("Expiry overview (evaluated {})", overview.today);

    println!("\nAll Documents");
    if overview.documents.is_empty() {
        println!("- none");
    }
    for view in &overview.documents {
        println!(
            "- {} - Expiry Date: {} [{}]",
            view.document.name, view.document.expiry_date, view.status_label
        );
    }

    println!("\nExpired Documents");
    render_documents(&overview.expired);

    println!(
        "\nDocuments Approaching Expiry (within {} days)",
        overview.approaching_days
    );
    render_documents(&overview.approaching);
}

fn render_dispatch(report: &DispatchReport) {
    if report.outcomes.is_empty() {
        println!("No documents approaching expiry; nothing to send.");
        return;
    }

    println!("Expiry reminder results");
    for outcome in &report.outcomes {
        let detail = match &outcome.status {
            ReminderStatus::Sent { recipient } => format!("sent to {recipient}"),
            ReminderStatus::MissingRecipient => "skipped, no recipient email".to_string(),
            ReminderStatus::TransportFailed { reason } => format!("failed: {reason}"),
            ReminderStatus::NotAttempted => "not attempted".to_string(),
        };
        println!("- #{} {}: {}", outcome.document_id, outcome.document_name, detail);
    }

    println!(
        "\n{} sent, {} missing recipient, {} failed, {} not attempted",
        report.sent(),
        report.missing_recipient(),
        report.failed(),
        report.not_attempted()
    );
}
