//! Location provider implementations.
//!
//! Each provider speaks its own response schema and normalizes it into
//! [`Location`] before returning. Providers carry their own HTTP client
//! with a client-level timeout; the resolver additionally bounds every
//! call with its own timeout.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alert_core::{Location, LocationError, LocationProvider, LocationSource};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

/// Accuracy score assigned to IP-based fixes.
const IP_ACCURACY: f64 = 0.8;

/// Client-level timeout for provider HTTP clients.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

fn build_client() -> Result<Client, LocationError> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| LocationError::Request(e.to_string()))
}

/// IP geolocation via ip-api.com.
pub struct IpApiProvider {
    http: Client,
    url: String,
}

/// ip-api.com response schema.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    /// The queried IP address, used as the address line.
    #[serde(default)]
    query: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
}

impl IpApiProvider {
    pub fn new() -> Result<Self, LocationError> {
        Ok(Self {
            http: build_client()?,
            url: "http://ip-api.com/json/".to_string(),
        })
    }

    /// Override the endpoint URL (for tests against a local server).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn normalize(response: IpApiResponse) -> Result<Location, LocationError> {
        if response.status != "success" {
            return Err(LocationError::Unavailable(format!(
                "ip-api status: {}",
                response.status
            )));
        }
        Ok(Location {
            latitude: response.lat,
            longitude: response.lon,
            address: response.query,
            city: response.city,
            country: response.country,
            source: LocationSource::Ip,
            accuracy: IP_ACCURACY,
            resolved_at: Utc::now(),
        })
    }
}

#[async_trait]
impl LocationProvider for IpApiProvider {
    async fn locate(&self) -> Result<Location, LocationError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!("HTTP {}", status)));
        }

        let parsed: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

        Self::normalize(parsed)
    }

    fn name(&self) -> &str {
        "ip-api.com"
    }
}

/// IP geolocation via ipapi.co.
pub struct IpapiCoProvider {
    http: Client,
    url: String,
}

/// ipapi.co response schema.
#[derive(Debug, Deserialize)]
struct IpapiCoResponse {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    ip: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country_name: String,
}

impl IpapiCoProvider {
    pub fn new() -> Result<Self, LocationError> {
        Ok(Self {
            http: build_client()?,
            url: "https://ipapi.co/json/".to_string(),
        })
    }

    /// Override the endpoint URL (for tests against a local server).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn normalize(response: IpapiCoResponse) -> Location {
        Location {
            latitude: response.latitude,
            longitude: response.longitude,
            address: response.ip,
            city: response.city,
            country: response.country_name,
            source: LocationSource::Ip,
            accuracy: IP_ACCURACY,
            resolved_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LocationProvider for IpapiCoProvider {
    async fn locate(&self) -> Result<Location, LocationError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!("HTTP {}", status)));
        }

        let parsed: IpapiCoResponse = response
            .json()
            .await
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

        Ok(Self::normalize(parsed))
    }

    fn name(&self) -> &str {
        "ipapi.co"
    }
}

/// A provider that always returns a fixed location.
///
/// Useful for wiring the pipeline in tests without touching the network.
pub struct StaticProvider {
    location: Location,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `locate` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationProvider for StaticProvider {
    async fn locate(&self) -> Result<Location, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut location = self.location.clone();
        location.resolved_at = Utc::now();
        Ok(location)
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// A provider that always fails.
pub struct FailingProvider {
    reason: String,
}

impl FailingProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LocationProvider for FailingProvider {
    async fn locate(&self) -> Result<Location, LocationError> {
        Err(LocationError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
