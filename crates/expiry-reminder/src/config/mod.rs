use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::documents::{FailurePolicy, SmtpCredentials, SmtpSettings};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub registry: RegistryConfig,
    pub reminders: ReminderConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database_path = env::var("EXPIRY_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("documents.db"));
        let approaching_days = parse_var("EXPIRY_APPROACHING_DAYS", 7u32)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            registry: RegistryConfig {
                database_path,
                approaching_days,
            },
            reminders: ReminderConfig::from_env()?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        _ => Ok(default),
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the document registry and the approaching-expiry window.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub database_path: PathBuf,
    pub approaching_days: u32,
}

/// Outbound mail settings. Credentials are optional so the registry can be
/// used without a mail account; dispatch refuses to run without them.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub timeout: Duration,
    pub credentials: Option<SmtpCredentials>,
    pub from_address: Option<String>,
    pub failure_policy: FailurePolicy,
}

impl ReminderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp_host = optional_var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string());
        let smtp_port = parse_var("SMTP_PORT", 587u16)?;

        let timeout_secs = parse_var("SMTP_TIMEOUT_SECS", 30u64)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "SMTP_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let credentials = match (optional_var("SMTP_USERNAME"), optional_var("SMTP_PASSWORD")) {
            (Some(username), Some(password)) => Some(SmtpCredentials::new(username, password)),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteCredentials),
        };

        let from_address = optional_var("REMINDER_FROM").or_else(|| {
            credentials
                .as_ref()
                .map(|credentials| credentials.username().to_string())
        });

        let failure_policy = match optional_var("REMINDER_FAILURE_POLICY") {
            Some(raw) => raw
                .parse::<FailurePolicy>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "REMINDER_FAILURE_POLICY",
                    value: raw,
                })?,
            None => FailurePolicy::default(),
        };

        Ok(Self {
            smtp_host,
            smtp_port,
            timeout: Duration::from_secs(timeout_secs),
            credentials,
            from_address,
            failure_policy,
        })
    }

    /// Builds transport settings when a sender account is configured.
    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        let credentials = self.credentials.clone()?;
        Some(SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            timeout: self.timeout,
            credentials,
        })
    }

    /// Replaces the sender account, keeping the From address in sync unless one
    /// was configured explicitly.
    pub fn with_sender(mut self, username: String, password: String) -> Self {
        if self.from_address.is_none()
            || self.from_address.as_deref()
                == self.credentials.as_ref().map(SmtpCredentials::username)
        {
            self.from_address = Some(username.clone());
        }
        self.credentials = Some(SmtpCredentials::new(username, password));
        self
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { name: &'static str, value: String },
    IncompleteCredentials,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "{name} has an invalid value '{value}'")
            }
            ConfigError::IncompleteCredentials => write!(
                f,
                "SMTP_USERNAME and SMTP_PASSWORD must be set together"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::IncompleteCredentials => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "EXPIRY_DATABASE_PATH",
            "EXPIRY_APPROACHING_DAYS",
            "SMTP_HOST",
            "SMTP_PORT",
            "SMTP_TIMEOUT_SECS",
            "SMTP_USERNAME",
            "SMTP_PASSWORD",
            "REMINDER_FROM",
            "REMINDER_FAILURE_POLICY",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.registry.database_path, PathBuf::from("documents.db"));
        assert_eq!(config.registry.approaching_days, 7);
        assert_eq!(config.reminders.smtp_host, "smtp.gmail.com");
        assert_eq!(config.reminders.smtp_port, 587);
        assert_eq!(config.reminders.timeout, Duration::from_secs(30));
        assert!(config.reminders.credentials.is_none());
        assert!(config.reminders.smtp_settings().is_none());
        assert_eq!(config.reminders.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn sender_defaults_from_address_to_username() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_USERNAME", "reminders@example.com");
        env::set_var("SMTP_PASSWORD", "app-password");
        env::set_var("REMINDER_FAILURE_POLICY", "abort");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(
            config.reminders.from_address.as_deref(),
            Some("reminders@example.com")
        );
        assert_eq!(config.reminders.failure_policy, FailurePolicy::Abort);
        let settings = config.reminders.smtp_settings().expect("settings built");
        assert_eq!(settings.credentials.username(), "reminders@example.com");
    }

    #[test]
    fn rejects_half_configured_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_USERNAME", "reminders@example.com");
        let result = AppConfig::load();
        reset_env();

        assert!(matches!(result, Err(ConfigError::IncompleteCredentials)));
    }

    #[test]
    fn rejects_non_numeric_window() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EXPIRY_APPROACHING_DAYS", "a week");
        let result = AppConfig::load();
        reset_env();

        match result {
            Err(ConfigError::InvalidValue { name, value }) => {
                assert_eq!(name, "EXPIRY_APPROACHING_DAYS");
                assert_eq!(value, "a week");
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn cli_sender_override_replaces_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads");
        let reminders = config
            .reminders
            .with_sender("office@example.com".to_string(), "secret".to_string());

        assert_eq!(reminders.from_address.as_deref(), Some("office@example.com"));
        assert!(reminders.smtp_settings().is_some());
    }
}
