//! Error types for the booking service.

use crate::booking::form::ValidationErrors;

/// Generic message shown to leads when the booking pipeline fails.
/// The underlying cause never reaches the user; it goes to the logs.
pub const MSG_BOOKING_FAILED: &str =
    "Une erreur est survenue lors de la prise de rendez-vous. Veuillez réessayer.";

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {key} ({hint})")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Storage errors, split into the failure signals the booking flow
/// distinguishes.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Storage unreachable: {0}")]
    Unreachable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Permission denied: {0}")]
    Denied(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Outbound mail errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Delivery failed: {0}")]
    Send(String),
}

/// Failures of the booking submission pipeline, one variant per step.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("Notification failed: {0}")]
    Notification(#[from] MailError),
}

impl BookingError {
    /// The single message shown to the lead, whatever went wrong.
    pub fn user_message(&self) -> &'static str {
        MSG_BOOKING_FAILED
    }
}

/// Operator session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid operator token")]
    InvalidToken,

    #[error("No active operator session")]
    NotAuthenticated,
}

pub type Result<T> = std::result::Result<T, Error>;
