//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Report content encryption configuration.
    pub encryption: EncryptionConfig,
    /// Media store configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Alert channel configuration.
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// Notification buffer and escalation configuration.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Bearer token granting access to admin endpoints. Admin routes are
    /// rejected when unset.
    #[serde(default)]
    pub admin_token: Option<String>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Report content encryption configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EncryptionConfig {
    /// 256-bit key, hex encoded (64 hex characters). Loaded once at startup;
    /// a single active key is assumed.
    pub key: String,
}

/// Media store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Chunk size for the chunked object store, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Maximum accepted size for a single media object, in bytes.
    #[serde(default = "default_max_media_size")]
    pub max_size: i64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_size: default_max_media_size(),
        }
    }
}

/// Alert channel configuration.
///
/// Each channel is optional; a missing section means the channel reports
/// `not_configured` at dispatch time rather than failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertsConfig {
    /// SMS provider credentials.
    #[serde(default)]
    pub sms: Option<SmsConfig>,
    /// SMTP credentials for email alerts.
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// Destination phone number for urgent SMS alerts.
    #[serde(default)]
    pub admin_phone: Option<String>,
    /// Destination address for urgent email alerts.
    #[serde(default)]
    pub admin_email: Option<String>,
}

/// SMS provider configuration (Twilio-compatible REST API).
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// Account SID.
    pub account_sid: String,
    /// Auth token.
    pub auth_token: String,
    /// Sender phone number.
    pub from_number: String,
    /// API base URL, overridable for testing.
    #[serde(default = "default_sms_api_base")]
    pub api_base: String,
}

/// SMTP configuration for email alerts.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// From address.
    pub from_address: String,
    /// From display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

/// Notification buffer and escalation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Capacity of the polling fallback buffer; oldest events are evicted
    /// beyond this bound.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Hours a report may sit unresolved before it is flagged for escalation.
    #[serde(default = "default_escalation_threshold_hours")]
    pub escalation_threshold_hours: i64,
    /// Minutes between escalation sweeps run by the server.
    #[serde(default = "default_escalation_sweep_minutes")]
    pub escalation_sweep_minutes: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            escalation_threshold_hours: default_escalation_threshold_hours(),
            escalation_sweep_minutes: default_escalation_sweep_minutes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_chunk_size() -> usize {
    256 * 1024
}

const fn default_max_media_size() -> i64 {
    256 * 1024 * 1024
}

fn default_sms_api_base() -> String {
    "https://api.twilio.com".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Haven Alerts".to_string()
}

const fn default_buffer_capacity() -> usize {
    50
}

const fn default_escalation_threshold_hours() -> i64 {
    2
}

const fn default_escalation_sweep_minutes() -> u64 {
    15
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `HAVEN_ENV`)
    /// 3. Environment variables with `HAVEN_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("HAVEN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HAVEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("HAVEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_defaults() {
        let config = NotificationsConfig::default();
        assert_eq!(config.buffer_capacity, 50);
        assert_eq!(config.escalation_threshold_hours, 2);
    }

    #[test]
    fn test_media_defaults() {
        let config = MediaConfig::default();
        assert_eq!(config.chunk_size, 256 * 1024);
        assert_eq!(config.max_size, 256 * 1024 * 1024);
    }
}
