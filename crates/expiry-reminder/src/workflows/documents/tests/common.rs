use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::workflows::documents::domain::{Document, DocumentId, NewDocument};
use crate::workflows::documents::mailer::{MailError, MailSender, OutgoingMail};
use crate::workflows::documents::registry::{DocumentRegistry, RegistryError};
use crate::workflows::documents::reminders::{FailurePolicy, ReminderDispatcher};
use crate::workflows::documents::service::DocumentService;
use crate::workflows::documents::sqlite::SqliteDocumentRegistry;

pub(super) const SENDER: &str = "reminders@example.com";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub(super) fn days_from_today(offset: i64) -> NaiveDate {
    today() + Duration::days(offset)
}

pub(super) fn upload(name: &str, offset: i64, recipient: Option<&str>) -> NewDocument {
    NewDocument {
        name: name.to_string(),
        expiry_date: days_from_today(offset),
        file_path: Some(format!("{}.pdf", name.to_lowercase().replace(' ', "_"))),
        recipient_email: recipient.map(str::to_string),
    }
}

pub(super) fn stored(id: i64, name: &str, offset: i64, recipient: Option<&str>) -> Document {
    let upload = upload(name, offset, recipient);
    Document {
        id: DocumentId(id),
        name: upload.name,
        expiry_date: upload.expiry_date,
        file_path: upload.file_path,
        recipient_email: upload.recipient_email,
    }
}

pub(super) fn sqlite_registry() -> (tempfile::TempDir, Arc<SqliteDocumentRegistry>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry =
        SqliteDocumentRegistry::open(dir.path().join("documents.db")).expect("registry opens");
    (dir, Arc::new(registry))
}

/// Registry seeded with documents dated yesterday, today, tomorrow, in five
/// days, and in thirty days.
pub(super) fn seeded_registry() -> (tempfile::TempDir, Arc<SqliteDocumentRegistry>) {
    let (dir, registry) = sqlite_registry();
    for document in [
        upload("Yesterday", -1, Some("a@example.com")),
        upload("Today", 0, Some("b@example.com")),
        upload("Tomorrow", 1, Some("c@example.com")),
        upload("Next Week", 5, Some("d@example.com")),
        upload("Next Month", 30, Some("e@example.com")),
    ] {
        registry.add(document).expect("seed document");
    }
    (dir, registry)
}

pub(super) fn names(documents: &[Document]) -> Vec<&str> {
    documents.iter().map(|doc| doc.name.as_str()).collect()
}

pub(super) fn dispatcher(policy: FailurePolicy) -> ReminderDispatcher {
    ReminderDispatcher::new(SENDER, policy)
}

pub(super) fn build_service() -> (
    tempfile::TempDir,
    DocumentService<SqliteDocumentRegistry>,
    Arc<SqliteDocumentRegistry>,
) {
    let (dir, registry) = sqlite_registry();
    let service = DocumentService::new(registry.clone(), 7);
    (dir, service, registry)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRegistry {
    pub(super) records: Arc<Mutex<Vec<Document>>>,
    next_id: Arc<Mutex<i64>>,
}

impl DocumentRegistry for MemoryRegistry {
    fn initialize(&self) -> Result<(), RegistryError> {
        Ok(())
    }

    fn add(&self, document: NewDocument) -> Result<DocumentId, RegistryError> {
        let mut next_id = self.next_id.lock().expect("id mutex poisoned");
        *next_id += 1;
        let id = DocumentId(*next_id);
        self.records
            .lock()
            .expect("registry mutex poisoned")
            .push(Document {
                id,
                name: document.name,
                expiry_date: document.expiry_date,
                file_path: document.file_path,
                recipient_email: document.recipient_email,
            });
        Ok(id)
    }

    fn delete(&self, id: DocumentId) -> Result<bool, RegistryError> {
        let mut guard = self.records.lock().expect("registry mutex poisoned");
        let before = guard.len();
        guard.retain(|doc| doc.id != id);
        Ok(guard.len() != before)
    }

    fn list_all(&self) -> Result<Vec<Document>, RegistryError> {
        Ok(self.records.lock().expect("registry mutex poisoned").clone())
    }
}

pub(super) struct UnavailableRegistry;

fn offline() -> RegistryError {
    RegistryError::Database(rusqlite::Error::InvalidQuery)
}

impl DocumentRegistry for UnavailableRegistry {
    fn initialize(&self) -> Result<(), RegistryError> {
        Err(offline())
    }

    fn add(&self, _document: NewDocument) -> Result<DocumentId, RegistryError> {
        Err(offline())
    }

    fn delete(&self, _id: DocumentId) -> Result<bool, RegistryError> {
        Err(offline())
    }

    fn list_all(&self) -> Result<Vec<Document>, RegistryError> {
        Err(offline())
    }
}

/// Records every message; recipients listed in `failing` get a transport error.
#[derive(Default, Clone)]
pub(super) struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    attempts: Arc<Mutex<usize>>,
    failing: HashSet<String>,
}

impl RecordingMailer {
    pub(super) fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }

    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("mailer mutex poisoned")
    }
}

impl MailSender for RecordingMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        *self.attempts.lock().expect("mailer mutex poisoned") += 1;
        if self.failing.contains(&mail.to) {
            return Err(MailError::Transport("connection reset".to_string()));
        }
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(mail.clone());
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
