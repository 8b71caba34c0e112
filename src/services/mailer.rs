use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpSettings;
use crate::errors::InternalError;

/// Outbound mail seam. The password-reset flow only needs one message shape,
/// so the trait stays narrow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_email(&self, to: &str, reset_token: &str) -> Result<(), InternalError>;
}

/// Production mailer over SMTP with TLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, InternalError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| InternalError::mail("smtp_relay", e.to_string()))?
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        let from = settings
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| InternalError::mail("parse_from_address", e.to_string()))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_reset_email(&self, to: &str, reset_token: &str) -> Result<(), InternalError> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| InternalError::mail("parse_to_address", e.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Password reset")
            .body(format!(
                "A password reset was requested for your account.\n\n\
                 Use this token within the next hour to set a new password:\n\n\
                 {}\n\n\
                 If you did not request this, you can ignore this message.",
                reset_token
            ))
            .map_err(|e| InternalError::mail("build_reset_email", e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| InternalError::mail("send_reset_email", e.to_string()))?;

        Ok(())
    }
}

/// Fallback mailer for setups without SMTP configured. Logs that a reset was
/// issued instead of delivering anything.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_email(&self, to: &str, _reset_token: &str) -> Result<(), InternalError> {
        tracing::info!(recipient = %to, "SMTP not configured; skipping reset email delivery");
        Ok(())
    }
}
