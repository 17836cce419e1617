// ledgerflow-core/src/domain/currency/rates.rs

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::code::CurrencyCode;

/// Where a resolved multiplier comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// The reporting currency itself: 1.0 by definition, never fetched.
    Identity,
    Provider,
}

impl RateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateSource::Identity => "identity",
            RateSource::Provider => "provider",
        }
    }
}

/// Why a currency has no multiplier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnresolvedReason {
    InvalidCode,
    /// The provider answered but the reporting currency was not among the rates.
    TargetMissing,
    InvalidMultiplier(f64),
    HttpStatus(u16),
    Rejected(String),
    Transport(String),
    Timeout,
    Malformed(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::InvalidCode => f.write_str("invalid currency code"),
            UnresolvedReason::TargetMissing => f.write_str("reporting currency absent from response"),
            UnresolvedReason::InvalidMultiplier(m) => write!(f, "invalid multiplier {}", m),
            UnresolvedReason::HttpStatus(code) => write!(f, "HTTP {}", code),
            UnresolvedReason::Rejected(why) => write!(f, "rejected: {}", why),
            UnresolvedReason::Transport(why) => write!(f, "transport: {}", why),
            UnresolvedReason::Timeout => f.write_str("timeout"),
            UnresolvedReason::Malformed(why) => write!(f, "malformed response: {}", why),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RateResolution {
    Resolved { multiplier: f64, source: RateSource },
    Unresolved { reason: UnresolvedReason },
}

impl RateResolution {
    pub fn multiplier(&self) -> Option<f64> {
        match self {
            RateResolution::Resolved { multiplier, .. } => Some(*multiplier),
            RateResolution::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, RateResolution::Resolved { .. })
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_resolved() {
            "resolved"
        } else {
            "unresolved"
        }
    }
}

/// Currency -> "to reporting currency" multiplier, with a status per currency.
/// Keys are the currency values exactly as observed in the cleaned expense table.
#[derive(Debug, Clone, Serialize)]
pub struct RateTable {
    reporting: CurrencyCode,
    entries: BTreeMap<String, RateResolution>,
}

impl RateTable {
    pub fn new(reporting: CurrencyCode) -> Self {
        Self {
            reporting,
            entries: BTreeMap::new(),
        }
    }

    pub fn reporting(&self) -> &CurrencyCode {
        &self.reporting
    }

    pub fn insert(&mut self, currency: impl Into<String>, resolution: RateResolution) {
        self.entries.insert(currency.into(), resolution);
    }

    pub fn get(&self, currency: &str) -> Option<&RateResolution> {
        self.entries.get(currency)
    }

    pub fn multiplier(&self, currency: &str) -> Option<f64> {
        self.get(currency).and_then(RateResolution::multiplier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RateResolution)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = (&String, &UnresolvedReason)> {
        self.entries.iter().filter_map(|(code, res)| match res {
            RateResolution::Unresolved { reason } => Some((code, reason)),
            RateResolution::Resolved { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_rate_table_lookup() -> Result<()> {
        let mut table = RateTable::new(CurrencyCode::parse("EUR")?);
        table.insert(
            "EUR",
            RateResolution::Resolved {
                multiplier: 1.0,
                source: RateSource::Identity,
            },
        );
        table.insert(
            "XOF",
            RateResolution::Unresolved {
                reason: UnresolvedReason::Timeout,
            },
        );

        assert_eq!(table.multiplier("EUR"), Some(1.0));
        assert_eq!(table.multiplier("XOF"), None);
        assert_eq!(table.multiplier("GBP"), None);
        assert_eq!(table.unresolved().count(), 1);
        assert_eq!(table.get("XOF").map(|r| r.status_label()), Some("unresolved"));
        Ok(())
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(UnresolvedReason::HttpStatus(429).to_string(), "HTTP 429");
        assert_eq!(
            UnresolvedReason::TargetMissing.to_string(),
            "reporting currency absent from response"
        );
    }
}
