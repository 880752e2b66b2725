//! The location resolver: cache first, then the provider chain.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use alert_core::{Location, LocationError, LocationProvider};
use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::providers::{IpApiProvider, IpapiCoProvider};

/// Default cache lifetime: one hour.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default per-provider call timeout.
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimum acceptable accuracy score for a fix.
const DEFAULT_MIN_ACCURACY: f64 = 0.5;

/// Configuration for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long a cached fix stays valid.
    pub cache_ttl: Duration,

    /// Timeout applied to each provider call, regardless of any timeout
    /// the provider's own client carries.
    pub provider_timeout: Duration,

    /// Fixes with a lower accuracy score are treated as invalid.
    pub min_accuracy: f64,

    /// Optional JSON file the cache slot is mirrored to, so a fix
    /// survives restarts.
    pub cache_file: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            min_accuracy: DEFAULT_MIN_ACCURACY,
            cache_file: None,
        }
    }
}

impl ResolverConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `LOCATION_CACHE_TTL_SECS` - cache lifetime (default: 3600)
    /// - `LOCATION_PROVIDER_TIMEOUT_SECS` - per-provider timeout (default: 5)
    /// - `LOCATION_CACHE_FILE` - path for the persisted cache slot
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = std::env::var("LOCATION_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(secs) = std::env::var("LOCATION_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.provider_timeout = Duration::from_secs(secs);
        }

        if let Ok(path) = std::env::var("LOCATION_CACHE_FILE") {
            config.cache_file = Some(PathBuf::from(path));
        }

        config
    }

    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the per-provider timeout.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Set the cache file path.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }
}

/// Resolves the user's position within bounded latency.
///
/// Resolution order: fresh cache entry, then each provider in priority
/// order. The first structurally valid, in-bounds fix wins and refreshes
/// the cache. When everything fails the resolver returns `None` -
/// "location unknown" is data, not an error, and the alert proceeds
/// without it.
pub struct LocationResolver {
    providers: Vec<Arc<dyn LocationProvider>>,
    cache: RwLock<Option<Location>>,
    config: ResolverConfig,
}

impl LocationResolver {
    /// Create a resolver over an ordered provider chain.
    pub fn new(config: ResolverConfig, providers: Vec<Arc<dyn LocationProvider>>) -> Self {
        let cached = config
            .cache_file
            .as_deref()
            .and_then(Self::load_cache_file);
        if cached.is_some() {
            debug!("loaded persisted location cache");
        }

        Self {
            providers,
            cache: RwLock::new(cached),
            config,
        }
    }

    /// Create a resolver with the standard IP geolocation chain:
    /// ip-api.com first, ipapi.co second.
    pub fn with_default_providers(config: ResolverConfig) -> Result<Self, LocationError> {
        let providers: Vec<Arc<dyn LocationProvider>> = vec![
            Arc::new(IpApiProvider::new()?),
            Arc::new(IpapiCoProvider::new()?),
        ];
        Ok(Self::new(config, providers))
    }

    /// Best-available current location, or `None` when unknown.
    pub async fn resolve(&self) -> Option<Location> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if self.is_fresh(cached) {
                debug!("using cached location");
                return Some(cached.clone());
            }
            debug!("cached location expired");
        }

        for provider in &self.providers {
            match timeout(self.config.provider_timeout, provider.locate()).await {
                Ok(Ok(location)) => {
                    if let Err(reason) = self.validate(&location) {
                        warn!(
                            "provider {} returned invalid location: {}",
                            provider.name(),
                            reason
                        );
                        continue;
                    }
                    info!(
                        "location resolved via {}: {}",
                        provider.name(),
                        location.summary()
                    );
                    self.store(location.clone()).await;
                    return Some(location);
                }
                Ok(Err(e)) => {
                    warn!("location provider {} failed: {}", provider.name(), e);
                }
                Err(_) => {
                    warn!(
                        "location provider {} timed out after {:?}",
                        provider.name(),
                        self.config.provider_timeout
                    );
                }
            }
        }

        warn!("all location providers exhausted, location unknown");
        None
    }

    /// The cached fix, if any, regardless of freshness.
    pub async fn cached(&self) -> Option<Location> {
        self.cache.read().await.clone()
    }

    /// Whether a fresh cached fix is available right now.
    pub async fn has_fresh_cache(&self) -> bool {
        match self.cache.read().await.as_ref() {
            Some(location) => self.is_fresh(location),
            None => false,
        }
    }

    fn is_fresh(&self, location: &Location) -> bool {
        let age = Utc::now().signed_duration_since(location.resolved_at);
        age.num_milliseconds() >= 0
            && (age.num_milliseconds() as u128) < self.config.cache_ttl.as_millis()
    }

    /// Structural validation: coordinate bounds, the (0,0) null island
    /// sentinel, and the minimum accuracy gate.
    fn validate(&self, location: &Location) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(format!("latitude out of range: {}", location.latitude));
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(format!("longitude out of range: {}", location.longitude));
        }
        if location.latitude == 0.0 && location.longitude == 0.0 {
            return Err("coordinates at (0,0)".to_string());
        }
        if location.accuracy < self.config.min_accuracy {
            return Err(format!("accuracy too low: {}", location.accuracy));
        }
        Ok(())
    }

    async fn store(&self, location: Location) {
        if let Some(path) = &self.config.cache_file {
            Self::persist_cache_file(path, &location);
        }
        *self.cache.write().await = Some(location);
    }

    fn load_cache_file(path: &Path) -> Option<Location> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(location) => Some(location),
            Err(e) => {
                warn!("ignoring corrupt location cache file: {}", e);
                None
            }
        }
    }

    fn persist_cache_file(path: &Path, location: &Location) {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!("failed to create cache dir: {}", e);
                    return;
                }
            }
        }
        match serde_json::to_string_pretty(location) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    warn!("failed to persist location cache: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize location cache: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FailingProvider, StaticProvider};
    use alert_core::LocationSource;

    fn sample_location() -> Location {
        Location {
            latitude: 59.9139,
            longitude: 10.7522,
            address: "203.0.113.9".to_string(),
            city: "Oslo".to_string(),
            country: "Norway".to_string(),
            source: LocationSource::Ip,
            accuracy: 0.8,
            resolved_at: Utc::now(),
        }
    }

    fn resolver_with(
        config: ResolverConfig,
        providers: Vec<Arc<dyn LocationProvider>>,
    ) -> LocationResolver {
        LocationResolver::new(config, providers)
    }

    #[tokio::test]
    async fn test_resolve_uses_first_provider() {
        let provider = Arc::new(StaticProvider::new(sample_location()));
        let resolver = resolver_with(ResolverConfig::default(), vec![provider.clone()]);

        let location = resolver.resolve().await.unwrap();
        assert_eq!(location.city, "Oslo");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_returns_cached_within_ttl() {
        let provider = Arc::new(StaticProvider::new(sample_location()));
        let resolver = resolver_with(ResolverConfig::default(), vec![provider.clone()]);

        let first = resolver.resolve().await.unwrap();
        let second = resolver.resolve().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.call_count(), 1, "cache hit must not call provider");
    }

    #[tokio::test]
    async fn test_resolve_refreshes_after_ttl() {
        let provider = Arc::new(StaticProvider::new(sample_location()));
        let config = ResolverConfig::default().with_cache_ttl(Duration::from_millis(30));
        let resolver = resolver_with(config, vec![provider.clone()]);

        resolver.resolve().await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        resolver.resolve().await.unwrap();

        assert_eq!(provider.call_count(), 2, "expired cache must refresh");
    }

    #[tokio::test]
    async fn test_resolve_falls_through_failing_provider() {
        let good = Arc::new(StaticProvider::new(sample_location()));
        let resolver = resolver_with(
            ResolverConfig::default(),
            vec![
                Arc::new(FailingProvider::new("service down")),
                good.clone(),
            ],
        );

        let location = resolver.resolve().await.unwrap();
        assert_eq!(location.city, "Oslo");
        assert_eq!(good.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_all_providers_fail_returns_none() {
        let resolver = resolver_with(
            ResolverConfig::default(),
            vec![
                Arc::new(FailingProvider::new("one")),
                Arc::new(FailingProvider::new("two")),
            ],
        );
        assert!(resolver.resolve().await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_skips_invalid_fix() {
        let mut null_island = sample_location();
        null_island.latitude = 0.0;
        null_island.longitude = 0.0;
        let good = Arc::new(StaticProvider::new(sample_location()));

        let resolver = resolver_with(
            ResolverConfig::default(),
            vec![Arc::new(StaticProvider::new(null_island)), good.clone()],
        );

        let location = resolver.resolve().await.unwrap();
        assert_eq!(location.city, "Oslo");
        assert_eq!(good.call_count(), 1);
    }

    #[tokio::test]
    async fn test_validation_rules() {
        let resolver = resolver_with(ResolverConfig::default(), vec![]);

        let valid = sample_location();
        assert!(resolver.validate(&valid).is_ok());

        let mut bad_lat = sample_location();
        bad_lat.latitude = 91.0;
        assert!(resolver.validate(&bad_lat).is_err());

        let mut bad_lon = sample_location();
        bad_lon.longitude = -181.0;
        assert!(resolver.validate(&bad_lon).is_err());

        let mut low_accuracy = sample_location();
        low_accuracy.accuracy = 0.2;
        assert!(resolver.validate(&low_accuracy).is_err());
    }

    #[tokio::test]
    async fn test_cache_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "geolocate-cache-{}.json",
            uuid::Uuid::new_v4().simple()
        ));

        let provider = Arc::new(StaticProvider::new(sample_location()));
        let config = ResolverConfig::default().with_cache_file(&path);
        let resolver = resolver_with(config.clone(), vec![provider]);
        resolver.resolve().await.unwrap();

        // A second resolver picks the fix up from disk without a lookup.
        let reloaded = resolver_with(config, vec![Arc::new(FailingProvider::new("down"))]);
        let location = reloaded.resolve().await.unwrap();
        assert_eq!(location.city, "Oslo");

        let _ = std::fs::remove_file(&path);
    }
}
