//! SMTP delivery via lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::SmtpConfig;
use crate::error::MailError;
use crate::mailer::{Mailer, OutboundEmail};

/// Sends mail through an SMTP relay (TLS via rustls).
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

/// Compose and deliver one message. Blocking; run from `spawn_blocking`.
/// Addresses are parsed before the transport is touched.
fn deliver(config: &SmtpConfig, email: &OutboundEmail) -> Result<(), MailError> {
    let mut builder = Message::builder()
        .from(
            config
                .from_address
                .parse()
                .map_err(|e| MailError::InvalidAddress(format!("from address: {e}")))?,
        )
        .subject(email.subject.clone())
        .header(ContentType::TEXT_HTML);
    for to in &email.to {
        builder = builder.to(to
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("recipient {to}: {e}")))?);
    }
    let message = builder
        .body(email.html.clone())
        .map_err(|e| MailError::Message(e.to_string()))?;

    let transport = SmtpTransport::relay(&config.host)
        .map_err(|e| MailError::Send(format!("SMTP relay setup: {e}")))?
        .port(config.port)
        .credentials(Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        ))
        .build();

    transport
        .send(&message)
        .map_err(|e| MailError::Send(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let config = self.config.clone();
        let message = email.clone();
        let recipients = email.to.join(", ");

        tokio::task::spawn_blocking(move || deliver(&config, &message))
            .await
            .map_err(|e| MailError::Send(format!("mail task: {e}")))??;

        info!(to = %recipients, "Email sent");
        Ok(())
    }
}
