use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use super::classifier::{ExpiryClassifier, ExpiryOverview};
use super::domain::{Document, DocumentId, NewDocument, ValidationError};
use super::mailer::MailSender;
use super::registry::{DocumentRegistry, RegistryError};
use super::reminders::{DispatchReport, ReminderDelivery, ReminderDispatcher};

/// Service composing the registry, the expiry window, and reminder dispatch.
pub struct DocumentService<R> {
    registry: Arc<R>,
    approaching_days: u32,
    delivery: Option<ReminderDelivery>,
}

impl<R> DocumentService<R>
where
    R: DocumentRegistry + 'static,
{
    pub fn new(registry: Arc<R>, approaching_days: u32) -> Self {
        Self {
            registry,
            approaching_days,
            delivery: None,
        }
    }

    /// Attach the configured mail transport used by [`Self::dispatch_reminders`].
    pub fn with_delivery(mut self, delivery: ReminderDelivery) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn reminders_enabled(&self) -> bool {
        self.delivery.is_some()
    }

    pub fn approaching_days(&self) -> u32 {
        self.approaching_days
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Validate an upload and store it.
    pub fn register(&self, document: NewDocument) -> Result<Document, DocumentServiceError> {
        document.validate()?;

        let id = self.registry.add(document.clone())?;
        Ok(Document {
            id,
            name: document.name,
            expiry_date: document.expiry_date,
            file_path: document.file_path,
            recipient_email: document.recipient_email,
        })
    }

    pub fn remove(&self, id: DocumentId) -> Result<bool, DocumentServiceError> {
        Ok(self.registry.delete(id)?)
    }

    pub fn documents(&self) -> Result<Vec<Document>, DocumentServiceError> {
        Ok(self.registry.list_all()?)
    }

    pub fn expiring_within(
        &self,
        today: NaiveDate,
        threshold_days: u32,
    ) -> Result<Vec<Document>, DocumentServiceError> {
        let documents =
            ExpiryClassifier::new(today).find_within(self.registry.as_ref(), threshold_days)?;
        Ok(documents)
    }

    pub fn expired(&self, today: NaiveDate) -> Result<Vec<Document>, DocumentServiceError> {
        self.expiring_within(today, 0)
    }

    pub fn approaching(&self, today: NaiveDate) -> Result<Vec<Document>, DocumentServiceError> {
        self.expiring_within(today, self.approaching_days)
    }

    pub fn overview(&self, today: NaiveDate) -> Result<ExpiryOverview, DocumentServiceError> {
        let overview =
            ExpiryClassifier::new(today).overview(self.registry.as_ref(), self.approaching_days)?;
        Ok(overview)
    }

    /// Send one reminder per approaching document through `sender`.
    pub fn send_reminders<M>(
        &self,
        today: NaiveDate,
        dispatcher: &ReminderDispatcher,
        sender: &M,
    ) -> Result<DispatchReport, DocumentServiceError>
    where
        M: MailSender + ?Sized,
    {
        let documents = self.approaching(today)?;
        let report = dispatcher.send_reminders(&documents, sender);
        self.log_dispatch(today, documents.len(), &report);
        Ok(report)
    }

    /// Send reminders through the attached delivery.
    pub fn dispatch_reminders(
        &self,
        today: NaiveDate,
    ) -> Result<DispatchReport, DocumentServiceError> {
        let delivery = self
            .delivery
            .as_ref()
            .ok_or(DocumentServiceError::RemindersDisabled)?;
        let documents = self.approaching(today)?;
        let report = delivery.deliver(&documents);
        self.log_dispatch(today, documents.len(), &report);
        Ok(report)
    }

    fn log_dispatch(&self, today: NaiveDate, documents: usize, report: &DispatchReport) {
        info!(
            %today,
            window_days = self.approaching_days,
            documents,
            sent = report.sent(),
            missing_recipient = report.missing_recipient(),
            failed = report.failed(),
            aborted = report.aborted,
            "reminder dispatch finished"
        );
    }
}

/// Error raised by the document service.
#[derive(Debug, thiserror::Error)]
pub enum DocumentServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("reminder delivery is not configured; set SMTP_USERNAME and SMTP_PASSWORD")]
    RemindersDisabled,
}
