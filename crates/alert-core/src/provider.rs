//! The location provider trait.

use async_trait::async_trait;

use crate::error::LocationError;
use crate::types::Location;

/// A single location lookup service.
///
/// Providers are tried in order by the resolver; each must normalize its
/// own response schema into a [`Location`]. Implementations should not
/// enforce their own long timeouts — the resolver bounds every call.
/// This trait is object-safe and used as `Arc<dyn LocationProvider>`.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Look up the current position.
    async fn locate(&self) -> Result<Location, LocationError>;

    /// Human-readable provider name for logs.
    fn name(&self) -> &str;
}
