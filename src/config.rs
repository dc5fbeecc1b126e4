//! Configuration types, loaded from `RDV_*` environment variables.

use std::net::SocketAddr;

use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DB_PATH: &str = "immo_rdv.db";
const DEFAULT_AGENCY_NAME: &str = "SHS Immobilier";
const DEFAULT_WHATSAPP_NUMBER: &str = "+33769316558";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 3600;

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http: HttpConfig,
    /// Path of the local SQLite database file.
    pub database_path: String,
    pub agency: AgencyConfig,
    pub smtp: SmtpConfig,
    /// Token operators present to open a management session.
    pub admin_token: SecretString,
    pub reminder: ReminderConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            http: HttpConfig::from_env()?,
            database_path: std::env::var("RDV_DB_PATH")
                .unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            agency: AgencyConfig::from_env(),
            smtp: SmtpConfig::from_env()?,
            admin_token: SecretString::from(required(
                "RDV_ADMIN_TOKEN",
                "token operators use to sign in",
            )?),
            reminder: ReminderConfig::from_env(),
        })
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub bind_addr: SocketAddr,
}

impl HttpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("RDV_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw.parse().map_err(|e| ConfigError::InvalidValue {
            key: "RDV_BIND_ADDR".to_string(),
            message: format!("{e}"),
        })?;
        Ok(Self { bind_addr })
    }
}

/// Identity of the agency the service books for.
#[derive(Debug, Clone)]
pub struct AgencyConfig {
    /// Display name used in emails and the startup banner.
    pub name: String,
    /// Destination number for the WhatsApp handoff link.
    pub whatsapp_number: String,
}

impl AgencyConfig {
    pub fn from_env() -> Self {
        Self {
            name: std::env::var("RDV_AGENCY_NAME")
                .unwrap_or_else(|_| DEFAULT_AGENCY_NAME.to_string()),
            whatsapp_number: std::env::var("RDV_WHATSAPP_NUMBER")
                .unwrap_or_else(|_| DEFAULT_WHATSAPP_NUMBER.to_string()),
        }
    }
}

impl Default for AgencyConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_AGENCY_NAME.to_string(),
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
        }
    }
}

/// SMTP relay credentials for outbound mail.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// From address on every email the service sends.
    pub from_address: String,
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: required("RDV_SMTP_HOST", "SMTP relay hostname")?,
            port: std::env::var("RDV_SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: required("RDV_SMTP_USERNAME", "SMTP account username")?,
            password: SecretString::from(required("RDV_SMTP_PASSWORD", "SMTP account password")?),
            from_address: required("RDV_MAIL_FROM", "From address for outbound mail")?,
        })
    }
}

/// Day-before reminder sweep configuration.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Seconds between sweeps. Zero disables the task entirely.
    pub interval_secs: u64,
}

impl ReminderConfig {
    pub fn from_env() -> Self {
        Self {
            interval_secs: std::env::var("RDV_REMINDER_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REMINDER_INTERVAL_SECS),
        }
    }

    pub fn enabled(&self) -> bool {
        self.interval_secs > 0
    }
}

fn required(key: &str, hint: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingRequired {
        key: key.to_string(),
        hint: hint.to_string(),
    })
}
