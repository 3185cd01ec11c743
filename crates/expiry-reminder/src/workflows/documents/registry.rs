use chrono::NaiveDate;

use super::domain::{Document, DocumentId, NewDocument};

/// Storage abstraction so the service and classifier can be exercised in isolation.
pub trait DocumentRegistry: Send + Sync {
    /// Ensures the backing table exists. Safe to call on every start.
    fn initialize(&self) -> Result<(), RegistryError>;
    fn add(&self, document: NewDocument) -> Result<DocumentId, RegistryError>;
    /// Returns whether a row was removed. Unknown ids are not an error.
    fn delete(&self, id: DocumentId) -> Result<bool, RegistryError>;
    fn list_all(&self) -> Result<Vec<Document>, RegistryError>;
}

/// Error enumeration for registry failures.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry storage failed: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("document {id} has an unreadable expiry date '{value}'")]
    CorruptRow { id: DocumentId, value: String },
}

/// Storage encoding for expiry dates; lexical order matches calendar order.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn decode_date(id: DocumentId, raw: &str) -> Result<NaiveDate, RegistryError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| RegistryError::CorruptRow {
        id,
        value: raw.to_string(),
    })
}
