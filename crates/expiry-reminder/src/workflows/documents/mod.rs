//! Document registry, expiry classification, and reminder dispatch.
//!
//! Expiry is never stored: every query derives it from a caller-supplied
//! `today`, which keeps the classifier deterministic under test.

pub mod classifier;
pub mod domain;
pub mod mailer;
pub mod registry;
pub mod reminders;
pub mod router;
pub mod service;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use classifier::{cutoff, DocumentStatusView, ExpiryClassifier, ExpiryOverview};
pub use domain::{Document, DocumentId, ExpiryStatus, NewDocument, ValidationError};
pub use mailer::{MailError, MailSender, OutgoingMail, SmtpCredentials, SmtpMailer, SmtpSettings};
pub use registry::{DocumentRegistry, RegistryError};
pub use reminders::{
    DispatchReport, FailurePolicy, ReminderDelivery, ReminderDispatcher, ReminderError,
    ReminderOutcome, ReminderStatus,
};
pub use router::document_router;
pub use service::{DocumentService, DocumentServiceError};
pub use sqlite::SqliteDocumentRegistry;
