// ledgerflow-core/src/infrastructure/adapters/exchange_rate_api.rs

//! Client for the exchangerate-api.com v6 `latest` endpoint.
//!
//! `GET {base_url}/{api_key}/latest/{base}` answers with
//! `{"result": "success", "conversion_rates": {"EUR": 0.92, ...}}` or
//! `{"result": "error", "error-type": "invalid-key"}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::infrastructure::error::InfrastructureError;
use crate::ports::rate_provider::{ConversionRates, ProviderError, RateProvider};

/// Connection-pooled client. The API key is part of the URL, so transport
/// errors are stripped of their URL before they leave this module.
pub struct ExchangeRateApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    conversion_rates: Option<ConversionRates>,
}

impl ExchangeRateApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InfrastructureError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, base: &str) -> String {
        format!("{}/{}/latest/{}", self.base_url, self.api_key, base)
    }
}

fn classify(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(err.without_url().to_string())
    }
}

#[async_trait]
impl RateProvider for ExchangeRateApiClient {
    async fn conversion_rates(&self, base: &str) -> Result<ConversionRates, ProviderError> {
        debug!(base, "Requesting conversion rates");

        let response = self
            .client
            .get(self.url(base))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;
        let parsed: Result<LatestResponse, _> = serde_json::from_str(&body);

        match parsed {
            Ok(payload) if payload.result == "success" => payload
                .conversion_rates
                .ok_or_else(|| ProviderError::Malformed("missing conversion_rates".into())),
            Ok(payload) => Err(ProviderError::Rejected(
                payload
                    .error_type
                    .unwrap_or_else(|| format!("result={}", payload.result)),
            )),
            Err(_) if !status.is_success() => Err(ProviderError::Status(status.as_u16())),
            Err(e) => Err(ProviderError::Malformed(e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "exchangerate-api"
    }
}
