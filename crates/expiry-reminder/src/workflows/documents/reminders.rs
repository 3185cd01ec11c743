use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Document, DocumentId};
use super::mailer::{MailError, MailSender, OutgoingMail};

pub const REMINDER_SUBJECT: &str = "Document Expiry Reminder";

/// What to do with the rest of a batch after a transport failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and move on to the next document.
    #[default]
    Continue,
    /// Stop at the first failure; later documents are left unattempted.
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "continue" | "continue-on-error" => Ok(Self::Continue),
            "abort" | "abort-on-error" => Ok(Self::Abort),
            other => Err(format!("unknown failure policy '{other}'")),
        }
    }
}

/// Per-document failure.
#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("document {0} has no recipient email")]
    MissingRecipient(DocumentId),
    #[error("reminder for document {id} not sent: {source}")]
    Transport {
        id: DocumentId,
        #[source]
        source: MailError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReminderStatus {
    Sent { recipient: String },
    MissingRecipient,
    TransportFailed { reason: String },
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderOutcome {
    pub document_id: DocumentId,
    pub document_name: String,
    #[serde(flatten)]
    pub status: ReminderStatus,
}

/// One outcome per input document, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub outcomes: Vec<ReminderOutcome>,
    pub aborted: bool,
}

impl DispatchReport {
    pub fn sent(&self) -> usize {
        self.count(|status| matches!(status, ReminderStatus::Sent { .. }))
    }

    pub fn missing_recipient(&self) -> usize {
        self.count(|status| matches!(status, ReminderStatus::MissingRecipient))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, ReminderStatus::TransportFailed { .. }))
    }

    pub fn not_attempted(&self) -> usize {
        self.count(|status| matches!(status, ReminderStatus::NotAttempted))
    }

    pub fn is_clean(&self) -> bool {
        self.sent() == self.outcomes.len()
    }

    fn count(&self, predicate: impl Fn(&ReminderStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}

/// Turns documents into outbound reminders. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct ReminderDispatcher {
    from: String,
    policy: FailurePolicy,
}

impl ReminderDispatcher {
    pub fn new(from: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            from: from.into(),
            policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn compose(&self, document: &Document) -> Result<OutgoingMail, ReminderError> {
        let recipient = document
            .recipient()
            .ok_or(ReminderError::MissingRecipient(document.id))?;

        Ok(OutgoingMail {
            from: self.from.clone(),
            to: recipient.to_string(),
            subject: format!("{REMINDER_SUBJECT}: {}", document.name),
            body: reminder_body(&document.name, document.expiry_date),
        })
    }

    pub fn send_one<M>(&self, document: &Document, sender: &M) -> Result<String, ReminderError>
    where
        M: MailSender + ?Sized,
    {
        let mail = self.compose(document)?;
        sender
            .send(&mail)
            .map_err(|source| ReminderError::Transport {
                id: document.id,
                source,
            })?;
        Ok(mail.to)
    }

    pub fn send_reminders<M>(&self, documents: &[Document], sender: &M) -> DispatchReport
    where
        M: MailSender + ?Sized,
    {
        let mut report = DispatchReport::default();

        for document in documents {
            let status = if report.aborted {
                ReminderStatus::NotAttempted
            } else {
                match self.send_one(document, sender) {
                    Ok(recipient) => {
                        info!(id = %document.id, %recipient, "expiry reminder sent");
                        ReminderStatus::Sent { recipient }
                    }
                    Err(ReminderError::MissingRecipient(id)) => {
                        warn!(%id, "reminder skipped, document has no recipient email");
                        ReminderStatus::MissingRecipient
                    }
                    Err(ReminderError::Transport { id, source }) => {
                        warn!(%id, error = %source, policy = ?self.policy, "reminder not sent");
                        if self.policy == FailurePolicy::Abort {
                            report.aborted = true;
                        }
                        ReminderStatus::TransportFailed {
                            reason: source.to_string(),
                        }
                    }
                }
            };

            report.outcomes.push(ReminderOutcome {
                document_id: document.id,
                document_name: document.name.clone(),
                status,
            });
        }

        report
    }
}

/// A dispatcher paired with the transport it sends through.
#[derive(Clone)]
pub struct ReminderDelivery {
    pub dispatcher: ReminderDispatcher,
    pub sender: Arc<dyn MailSender>,
}

impl ReminderDelivery {
    pub fn new(dispatcher: ReminderDispatcher, sender: Arc<dyn MailSender>) -> Self {
        Self { dispatcher, sender }
    }

    pub fn deliver(&self, documents: &[Document]) -> DispatchReport {
        self.dispatcher
            .send_reminders(documents, self.sender.as_ref())
    }
}

fn reminder_body(name: &str, expiry_date: NaiveDate) -> String {
    format!(
        "Dear User,\n\nThis is a reminder that your document '{name}' is approaching expiry on {expiry_date}.\n\nPlease take necessary action.\n\nRegards,\nExpiry Reminder"
    )
}
