//! Email alert channel.
//!
//! Delivers urgent alerts over SMTP via lettre. Credentials are process-wide
//! configuration supplied at startup; a service without configuration
//! reports `not_configured` instead of attempting delivery.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use serde::Serialize;

use haven_common::{AppError, AppResult, config::EmailConfig};

/// Email delivery result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDeliveryResult {
    /// Whether the relay accepted the message.
    pub success: bool,
    /// Error message (if failed).
    pub error: Option<String>,
}

/// Email channel client.
#[derive(Clone)]
pub struct EmailService {
    config: Option<EmailConfig>,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailService {
    /// Create a new email service.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the relay host cannot be used to
    /// build an SMTP transport.
    pub fn new(config: Option<EmailConfig>) -> AppResult<Self> {
        let transport = match &config {
            Some(cfg) => {
                let mut builder =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
                        .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
                        .port(cfg.smtp_port);

                if let (Some(username), Some(password)) = (&cfg.username, &cfg.password) {
                    builder = builder
                        .credentials(Credentials::new(username.clone(), password.clone()));
                }

                Some(builder.build())
            }
            None => None,
        };

        Ok(Self { config, transport })
    }

    /// Check if the email channel is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send a plain-text alert email.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ChannelNotConfigured`] without any network
    /// activity when SMTP is not configured. Relay rejections are reported
    /// through the result with `success = false`.
    pub async fn send_alert(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
    ) -> AppResult<EmailDeliveryResult> {
        let (config, transport) = match (&self.config, &self.transport) {
            (Some(c), Some(t)) => (c, t),
            _ => return Err(AppError::ChannelNotConfigured("email".to_string())),
        };

        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;
        let to = to
            .parse()
            .map_err(|e| AppError::ChannelDelivery(format!("Invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(text_body.to_string())
            .map_err(|e| AppError::ChannelDelivery(format!("Failed to build email: {e}")))?;

        match transport.send(message).await {
            Ok(_) => Ok(EmailDeliveryResult {
                success: true,
                error: None,
            }),
            Err(e) => Ok(EmailDeliveryResult {
                success: false,
                error: Some(e.to_string()),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_send_is_not_configured() {
        let service = EmailService::new(None).unwrap();
        assert!(!service.is_enabled());

        assert!(matches!(
            service.send_alert("admin@example.com", "subject", "body").await,
            Err(AppError::ChannelNotConfigured(_))
        ));
    }
}
