// ledgerflow-core/src/ports/rate_provider.rs

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// `conversion_rates` of one base currency: 1 unit of base = value units of key.
pub type ConversionRates = HashMap<String, f64>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("HTTP status {0}")]
    Status(u16),

    /// The provider answered but refused the request (`result != success`).
    #[error("rejected by provider: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// One request: all rates for `base`.
    async fn conversion_rates(&self, base: &str) -> Result<ConversionRates, ProviderError>;

    fn name(&self) -> &str;
}
