//! SMS alert channel.
//!
//! Delivers urgent alerts through a Twilio-compatible REST API. Credentials
//! are process-wide configuration supplied at startup; a service without
//! credentials reports `not_configured` instead of attempting delivery.

use haven_common::{AppError, AppResult, config::SmsConfig};
use serde::{Deserialize, Serialize};

/// SMS delivery result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsDeliveryResult {
    /// Whether the message was accepted by the provider.
    pub success: bool,
    /// Provider message SID (if available).
    pub sid: Option<String>,
    /// Error message (if failed).
    pub error: Option<String>,
}

/// SMS channel client.
#[derive(Clone)]
pub struct SmsService {
    config: Option<SmsConfig>,
    http_client: reqwest::Client,
}

impl SmsService {
    /// Create a new SMS service.
    #[must_use]
    pub fn new(config: Option<SmsConfig>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Check if the SMS channel is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send a text message.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ChannelNotConfigured`] without any network
    /// activity when credentials are missing, and
    /// [`AppError::ChannelDelivery`] when the provider request itself fails.
    /// A provider-side rejection is reported through the result with
    /// `success = false`.
    pub async fn send(&self, to: &str, body: &str) -> AppResult<SmsDeliveryResult> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AppError::ChannelNotConfigured("sms".to_string()))?;

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base.trim_end_matches('/'),
            config.account_sid
        );

        let form_params = [
            ("To", to),
            ("From", config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http_client
            .post(url)
            .basic_auth(&config.account_sid, Some(&config.auth_token))
            .form(&form_params)
            .send()
            .await
            .map_err(|e| AppError::ChannelDelivery(format!("SMS request failed: {e}")))?;

        if response.status().is_success() {
            #[derive(Deserialize)]
            struct ProviderResponse {
                sid: Option<String>,
            }
            let result: ProviderResponse = response
                .json()
                .await
                .unwrap_or(ProviderResponse { sid: None });
            Ok(SmsDeliveryResult {
                success: true,
                sid: result.sid,
                error: None,
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Ok(SmsDeliveryResult {
                success: false,
                sid: None,
                error: Some(error_text),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_send_is_not_configured() {
        let service = SmsService::new(None);
        assert!(!service.is_enabled());

        assert!(matches!(
            service.send("+15550001111", "test").await,
            Err(AppError::ChannelNotConfigured(_))
        ));
    }
}
