//! Outbound mail.

mod smtp;
pub mod templates;

pub use smtp::SmtpMailer;

use async_trait::async_trait;

use crate::error::MailError;

/// An outbound HTML email.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Mail delivery seam. The booking flow and the reminder sweep depend on
/// this, not on SMTP.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}
