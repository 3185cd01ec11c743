use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::domain::{Document, ExpiryStatus};
use super::registry::{DocumentRegistry, RegistryError};

/// Last calendar day covered by a window of `threshold_days` starting at `today`.
pub fn cutoff(today: NaiveDate, threshold_days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(threshold_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Filters documents against a fixed `today`.
///
/// The filter is an upper bound, not a range: anything already expired is
/// also "within" every threshold. Expired and approaching lists therefore
/// overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryClassifier {
    today: NaiveDate,
}

impl ExpiryClassifier {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn is_within(&self, document: &Document, threshold_days: u32) -> bool {
        document.expiry_date <= cutoff(self.today, threshold_days)
    }

    /// Every registry entry with `expiry_date <= today + threshold_days`.
    pub fn find_within<R>(
        &self,
        registry: &R,
        threshold_days: u32,
    ) -> Result<Vec<Document>, RegistryError>
    where
        R: DocumentRegistry + ?Sized,
    {
        let documents = registry.list_all()?;
        Ok(self.filter_within(documents, threshold_days))
    }

    pub fn filter_within(&self, documents: Vec<Document>, threshold_days: u32) -> Vec<Document> {
        documents
            .into_iter()
            .filter(|document| self.is_within(document, threshold_days))
            .collect()
    }

    /// The three lists shown on the documents page.
    pub fn overview<R>(
        &self,
        registry: &R,
        approaching_days: u32,
    ) -> Result<ExpiryOverview, RegistryError>
    where
        R: DocumentRegistry + ?Sized,
    {
        let documents = registry.list_all()?;
        let expired = self.filter_within(documents.clone(), 0);
        let approaching = self.filter_within(documents.clone(), approaching_days);

        let all = documents
            .into_iter()
            .map(|document| {
                let status = document.status(self.today, approaching_days);
                DocumentStatusView {
                    status_label: status.label(),
                    status,
                    document,
                }
            })
            .collect();

        Ok(ExpiryOverview {
            today: self.today,
            approaching_days,
            documents: all,
            expired,
            approaching,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentStatusView {
    #[serde(flatten)]
    pub document: Document,
    pub status: ExpiryStatus,
    pub status_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpiryOverview {
    pub today: NaiveDate,
    pub approaching_days: u32,
    pub documents: Vec<DocumentStatusView>,
    pub expired: Vec<Document>,
    pub approaching: Vec<Document>,
}
