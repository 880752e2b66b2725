//! Configuration for the Twilio gateway.

use std::env;

use crate::error::GatewayError;

/// Default Twilio API host.
const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Credentials and endpoint for the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Account SID ("AC...").
    pub account_sid: String,
    /// Auth token.
    pub auth_token: String,
    /// E.164 number messages are sent from.
    pub from_number: String,
    /// API base URL (overridable for tests).
    pub base_url: String,
}

impl TwilioConfig {
    /// Create a configuration with explicit credentials.
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `TWILIO_ACCOUNT_SID`
    /// - `TWILIO_AUTH_TOKEN`
    /// - `TWILIO_PHONE_NUMBER`
    ///
    /// A missing variable yields a [`GatewayError::Config`]; callers
    /// treat that as "no gateway configured" and use the fallback channel.
    pub fn from_env() -> Result<Self, GatewayError> {
        let account_sid = env::var("TWILIO_ACCOUNT_SID")
            .map_err(|_| GatewayError::Config("TWILIO_ACCOUNT_SID not set".to_string()))?;
        let auth_token = env::var("TWILIO_AUTH_TOKEN")
            .map_err(|_| GatewayError::Config("TWILIO_AUTH_TOKEN not set".to_string()))?;
        let from_number = env::var("TWILIO_PHONE_NUMBER")
            .map_err(|_| GatewayError::Config("TWILIO_PHONE_NUMBER not set".to_string()))?;

        Ok(Self::new(account_sid, auth_token, from_number))
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The Messages endpoint URL for this account.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}
