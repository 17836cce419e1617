// ledgerflow-core/src/infrastructure/adapters/mod.rs

pub mod duckdb;
pub mod exchange_rate_api;
pub mod parquet_store;
pub mod source_reader;
pub mod static_rates;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::project::{FxProviderKind, ProjectConfig};
use crate::infrastructure::error::InfrastructureError;
use crate::ports::rate_provider::RateProvider;

/// Builds the rate provider selected by `fx.provider`.
pub fn build_rate_provider(
    config: &ProjectConfig,
) -> Result<Arc<dyn RateProvider>, InfrastructureError> {
    let fx = &config.fx;
    match fx.provider {
        FxProviderKind::Static => Ok(Arc::new(static_rates::StaticRateProvider::new(
            config.reporting_currency.as_str(),
            &fx.static_rates,
        ))),
        FxProviderKind::ExchangerateApi => {
            let api_key = fx
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    InfrastructureError::ConfigError(
                        "fx.api-key is required for the exchangerate-api provider \
                         (set LEDGERFLOW_FX_API_KEY)"
                            .into(),
                    )
                })?;
            Ok(Arc::new(exchange_rate_api::ExchangeRateApiClient::new(
                fx.base_url.clone(),
                api_key,
                Duration::from_secs(fx.timeout_secs),
            )?))
        }
    }
}
