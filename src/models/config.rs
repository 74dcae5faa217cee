//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_access_token_ttl() -> i64 {
    900
}

fn default_refresh_token_ttl() -> i64 {
    604_800
}

fn default_notification_poll() -> u64 {
    4
}

#[derive(Clone, Debug, Deserialize)]
/// Settings shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    /// Signs access tokens.
    pub jwt_secret: String,
    /// Signs refresh tokens.
    pub jwt_refresh_secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_secs: i64,
    /// Shared secret expected in `X-Webhook-Secret` when set.
    #[serde(default)]
    pub payment_webhook_secret: Option<String>,
    /// Base URL used when building client payment links.
    pub public_url: String,
    /// Seconds between polls of the notification stream.
    #[serde(default = "default_notification_poll")]
    pub notification_poll_secs: u64,
}
