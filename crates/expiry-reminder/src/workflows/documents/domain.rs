use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry-assigned identifier. Monotonic and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked PDF with an expiry date and optional notification recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub expiry_date: NaiveDate,
    pub file_path: Option<String>,
    pub recipient_email: Option<String>,
}

impl Document {
    /// Expiry relative to `today`. Never persisted.
    pub fn status(&self, today: NaiveDate, approaching_days: u32) -> ExpiryStatus {
        ExpiryStatus::classify(self.expiry_date, today, approaching_days)
    }

    /// Recipient address with surrounding whitespace removed, if one is usable.
    pub fn recipient(&self) -> Option<&str> {
        self.recipient_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Fields supplied when registering a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub name: String,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
}

impl NewDocument {
    /// Upload-boundary checks. The registry itself stores whatever it is given.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        match self.file_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(()),
            _ => Err(ValidationError::MissingFile),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("document name must not be empty")]
    EmptyName,
    #[error("please upload a PDF file")]
    MissingFile,
}

/// Display classification for a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiresToday,
    Approaching,
    Current,
}

impl ExpiryStatus {
    pub fn classify(expiry_date: NaiveDate, today: NaiveDate, approaching_days: u32) -> Self {
        if expiry_date < today {
            Self::Expired
        } else if expiry_date == today {
            Self::ExpiresToday
        } else if expiry_date <= super::classifier::cutoff(today, approaching_days) {
            Self::Approaching
        } else {
            Self::Current
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Expired => "Expired",
            Self::ExpiresToday => "Expires today",
            Self::Approaching => "Approaching expiry",
            Self::Current => "Current",
        }
    }
}
