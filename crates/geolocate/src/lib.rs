//! Location resolution for the emergency alert pipeline.
//!
//! This crate provides the [`LocationResolver`], which answers "where is
//! the user right now?" within bounded latency:
//!
//! 1. A cached fix younger than the TTL is returned as-is.
//! 2. Otherwise a prioritized chain of [`LocationProvider`]s is tried in
//!    order, each call bounded by a timeout; the first valid fix wins
//!    and refreshes the cache.
//! 3. If every provider fails, the resolver returns `None` - callers
//!    treat "location unknown" as data and proceed with the alert.
//!
//! Two IP-geolocation providers are included ([`IpApiProvider`],
//! [`IpapiCoProvider`]) plus a [`StaticProvider`] test double. Adding a
//! provider is an impl of the trait, not a control-flow change.
//!
//! [`LocationProvider`]: alert_core::LocationProvider

mod providers;
mod resolver;

pub use providers::{FailingProvider, IpApiProvider, IpapiCoProvider, StaticProvider};
pub use resolver::{LocationResolver, ResolverConfig};

// Re-export commonly used types from alert-core
pub use alert_core::{Location, LocationError, LocationProvider, LocationSource};
