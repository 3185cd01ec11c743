use std::fmt;
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

/// A single outbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail hook. The SMTP adapter below is the production implementation.
pub trait MailSender: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mail address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("unable to build message: {0}")]
    Message(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Sender account, passed explicitly to every transport that needs it.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    username: String,
    password: String,
}

impl SmtpCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub credentials: SmtpCredentials,
}

/// Authenticated STARTTLS relay with a bounded per-command timeout.
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Result<Self, MailError> {
        let SmtpSettings {
            host,
            port,
            timeout,
            credentials,
        } = settings;

        let transport = SmtpTransport::starttls_relay(&host)
            .map_err(|err| MailError::Transport(err.to_string()))?
            .port(port)
            .credentials(Credentials::new(credentials.username, credentials.password))
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport })
    }
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

impl MailSender for SmtpMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = build_message(mail)?;
        self.transport
            .send(&message)
            .map_err(|err| MailError::Transport(err.to_string()))?;
        debug!(to = %mail.to, subject = %mail.subject, "mail accepted by relay");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|err| MailError::InvalidAddress {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

pub(crate) fn build_message(mail: &OutgoingMail) -> Result<Message, MailError> {
    Message::builder()
        .from(parse_mailbox(&mail.from)?)
        .to(parse_mailbox(&mail.to)?)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())
        .map_err(|err| MailError::Message(err.to_string()))
}
