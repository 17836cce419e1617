// ledgerflow-core/src/infrastructure/adapters/static_rates.rs

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::ports::rate_provider::{ConversionRates, ProviderError, RateProvider};

/// Offline provider built from `fx.static-rates`: multipliers from each listed
/// currency to the reporting currency. Answers like the remote API would for
/// a `base` request, with the reporting currency as the only target.
pub struct StaticRateProvider {
    reporting: String,
    multipliers: BTreeMap<String, f64>,
}

impl StaticRateProvider {
    pub fn new(reporting: impl Into<String>, multipliers: &BTreeMap<String, f64>) -> Self {
        Self {
            reporting: reporting.into(),
            multipliers: multipliers
                .iter()
                .map(|(code, rate)| (code.trim().to_ascii_uppercase(), *rate))
                .collect(),
        }
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn conversion_rates(&self, base: &str) -> Result<ConversionRates, ProviderError> {
        match self.multipliers.get(base) {
            Some(rate) => Ok(ConversionRates::from([(self.reporting.clone(), *rate)])),
            None => Err(ProviderError::Rejected("unsupported-code".into())),
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}
