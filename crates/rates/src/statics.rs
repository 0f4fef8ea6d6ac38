//! Static rate provider for tests and local runs
//!
//! Stores fixed rates that can be updated programmatically.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::keys::{COLLATERAL_YIELD_RATE, FINANCING_PERCENTAGE, PENALTY_RATE};
use crate::provider::RateProvider;
use crate::RateError;

/// Fixed in-memory rate provider.
pub struct StaticRates {
    rates: RwLock<HashMap<String, Decimal>>,
}

impl StaticRates {
    /// Create a new empty provider
    pub fn new() -> Self {
        Self {
            rates: RwLock::new(HashMap::new()),
        }
    }

    /// Create a provider with the platform defaults:
    /// 3% liquidation penalty, 15% financing percentage, 8% yield.
    pub fn with_defaults() -> Self {
        let rates = Self::new();
        rates.set_rate(PENALTY_RATE, Decimal::from(3));
        rates.set_rate(FINANCING_PERCENTAGE, Decimal::from(15));
        rates.set_rate(COLLATERAL_YIELD_RATE, Decimal::from(8));
        rates
    }

    /// Set a rate value for a key
    pub fn set_rate(&self, key: impl Into<String>, value: Decimal) {
        let mut rates = self.rates.write().unwrap();
        rates.insert(key.into(), value);
    }

    /// Remove a key (for testing missing-configuration handling)
    pub fn remove_rate(&self, key: &str) {
        let mut rates = self.rates.write().unwrap();
        rates.remove(key);
    }
}

impl Default for StaticRates {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl RateProvider for StaticRates {
    async fn get_rate(&self, key: &str) -> Result<Decimal, RateError> {
        let rates = self.rates.read().unwrap();
        let value = rates
            .get(key)
            .copied()
            .ok_or_else(|| RateError::KeyNotFound {
                key: key.to_string(),
            })?;
        if value < Decimal::ZERO {
            return Err(RateError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                reason: "rates must be non-negative",
            });
        }
        Ok(value)
    }

    async fn configured_keys(&self) -> Vec<String> {
        let rates = self.rates.read().unwrap();
        rates.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_defaults() {
        let rates = StaticRates::with_defaults();
        assert_eq!(rates.get_rate(PENALTY_RATE).await.unwrap(), dec!(3));
        assert_eq!(rates.get_rate(FINANCING_PERCENTAGE).await.unwrap(), dec!(15));
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let rates = StaticRates::new();
        assert!(rates.get_rate(PENALTY_RATE).await.is_err());

        rates.set_rate(PENALTY_RATE, dec!(4.5));
        assert_eq!(rates.get_rate(PENALTY_RATE).await.unwrap(), dec!(4.5));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let rates = StaticRates::new();
        let result = rates.get_rate("rates.unknown").await;
        assert!(matches!(result, Err(RateError::KeyNotFound { .. })));
    }

    #[tokio::test]
    async fn test_negative_rate_rejected() {
        let rates = StaticRates::new();
        rates.set_rate(PENALTY_RATE, dec!(-1));
        let result = rates.get_rate(PENALTY_RATE).await;
        assert!(matches!(result, Err(RateError::InvalidValue { .. })));
    }
}
