//! Twilio Messages API client.

use std::time::Duration;

use alert_core::{DeliveryChannel, DeliveryError, DeliveryReceipt};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::TwilioConfig;
use crate::error::GatewayError;

/// Client-level timeout for gateway requests. The dispatcher applies its
/// own call-site timeout on top of this.
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Response from a successful message creation.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioMessage {
    /// Message SID ("SM...").
    pub sid: String,
    /// Delivery status as reported by Twilio ("queued", "sent", ...).
    pub status: String,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Client for the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioGateway {
    http: Client,
    config: TwilioConfig,
}

impl TwilioGateway {
    /// Create a gateway with the given configuration.
    pub fn new(config: TwilioConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self { http, config })
    }

    /// Create a gateway from environment variables (see
    /// [`TwilioConfig::from_env`]).
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(TwilioConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &TwilioConfig {
        &self.config
    }

    /// Send one SMS.
    pub async fn send_sms(&self, to: &str, body: &str) -> Result<TwilioMessage, GatewayError> {
        let url = self.config.messages_url();
        debug!("sending SMS to {} via {}", to, url);

        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(GatewayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let message: TwilioMessage = response.json().await.map_err(GatewayError::Http)?;
        info!(
            "SMS accepted by Twilio: sid={} status={}",
            message.sid, message.status
        );
        Ok(message)
    }
}

#[async_trait]
impl DeliveryChannel for TwilioGateway {
    async fn deliver(&self, phone: &str, body: &str) -> Result<DeliveryReceipt, DeliveryError> {
        let message = self
            .send_sms(phone, body)
            .await
            .map_err(|e| DeliveryError::Gateway(e.to_string()))?;

        Ok(DeliveryReceipt {
            message_id: message.sid,
            status: message.status,
        })
    }

    fn name(&self) -> &str {
        "twilio"
    }
}
