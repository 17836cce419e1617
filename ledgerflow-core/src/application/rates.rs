// ledgerflow-core/src/application/rates.rs

use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

use crate::domain::currency::{
    CurrencyCode, RateResolution, RateSource, RateTable, TokenBucket, UnresolvedReason,
};
use crate::domain::project::FxConfig;
use crate::ports::rate_provider::{ProviderError, RateProvider};

/// Resolves one "to reporting currency" multiplier per observed currency.
///
/// Lookups run sequentially behind a token bucket, each bounded by a timeout.
/// A failure only marks its own currency unresolved; `resolve` never fails.
pub struct RateResolver<'a> {
    provider: &'a dyn RateProvider,
    limiter: TokenBucket,
    timeout: Duration,
}

impl<'a> RateResolver<'a> {
    pub fn new(provider: &'a dyn RateProvider, fx: &FxConfig) -> Self {
        Self::with_limits(
            provider,
            TokenBucket::new(fx.requests_per_second, fx.burst),
            Duration::from_secs(fx.timeout_secs),
        )
    }

    pub fn with_limits(provider: &'a dyn RateProvider, limiter: TokenBucket, timeout: Duration) -> Self {
        Self {
            provider,
            limiter,
            timeout,
        }
    }

    #[instrument(skip(self, observed), fields(provider = self.provider.name(), currencies = observed.len()))]
    pub async fn resolve(&mut self, observed: &[String], reporting: &CurrencyCode) -> RateTable {
        let mut table = RateTable::new(reporting.clone());

        let mut codes: Vec<&String> = observed.iter().collect();
        codes.sort();
        codes.dedup();

        for raw in codes {
            let resolution = match CurrencyCode::parse(raw) {
                Err(_) => RateResolution::Unresolved {
                    reason: UnresolvedReason::InvalidCode,
                },
                // 1. Identité: jamais d'appel réseau
                Ok(code) if &code == reporting => RateResolution::Resolved {
                    multiplier: 1.0,
                    source: RateSource::Identity,
                },
                Ok(code) => self.lookup(&code, reporting).await,
            };

            match &resolution {
                RateResolution::Resolved { multiplier, .. } => {
                    println!("   💱 {} -> {}: {}", raw, reporting, multiplier);
                }
                RateResolution::Unresolved { reason } => {
                    println!("   ⚠️  {} -> {}: unresolved ({})", raw, reporting, reason);
                }
            }
            table.insert(raw.clone(), resolution);
        }

        info!(
            resolved = table.iter().filter(|(_, r)| r.is_resolved()).count(),
            unresolved = table.unresolved().count(),
            "Rate resolution finished"
        );
        table
    }

    async fn lookup(&mut self, code: &CurrencyCode, reporting: &CurrencyCode) -> RateResolution {
        // 2. Throttle
        let wait = self.limiter.acquire(Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        // 3. Appel borné par le timeout
        let response =
            match tokio::time::timeout(self.timeout, self.provider.conversion_rates(code.as_str()))
                .await
            {
                Ok(response) => response,
                Err(_) => Err(ProviderError::Timeout),
            };

        // 4. Classification
        let reason = match response {
            Ok(rates) => match rates.get(reporting.as_str()).copied() {
                Some(m) if m.is_finite() && m > 0.0 => {
                    return RateResolution::Resolved {
                        multiplier: m,
                        source: RateSource::Provider,
                    };
                }
                Some(m) => {
                    warn!(currency = %code, multiplier = m, "Provider returned an unusable multiplier");
                    UnresolvedReason::InvalidMultiplier(m)
                }
                None => {
                    warn!(currency = %code, target = %reporting, "Reporting currency absent from provider response");
                    UnresolvedReason::TargetMissing
                }
            },
            Err(e) => {
                error!(currency = %code, error = %e, "Rate lookup failed");
                match e {
                    ProviderError::Status(status) => UnresolvedReason::HttpStatus(status),
                    ProviderError::Rejected(why) => UnresolvedReason::Rejected(why),
                    ProviderError::Transport(why) => UnresolvedReason::Transport(why),
                    ProviderError::Timeout => UnresolvedReason::Timeout,
                    ProviderError::Malformed(why) => UnresolvedReason::Malformed(why),
                }
            }
        };

        RateResolution::Unresolved { reason }
    }
}
