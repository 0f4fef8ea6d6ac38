//! RateProvider trait - interface to the configuration service

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::RateError;

/// Interface for the external rate/configuration provider.
///
/// Implementations can be:
/// - StaticRates: fixed values for tests and local runs
/// - A client for the platform configuration service
///
/// Lookups are fast, synchronous-style reads; no implementation should
/// suspend on slow I/O inside a mutation path.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Resolve a rate by its string key.
    ///
    /// Returned values are percentages (e.g. `3` means 3%) and must be
    /// non-negative; implementations reject negative configuration with
    /// [`RateError::InvalidValue`].
    async fn get_rate(&self, key: &str) -> Result<Decimal, RateError>;

    /// List all configured keys (for diagnostics)
    async fn configured_keys(&self) -> Vec<String>;
}
