// ledgerflow-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::domain::calendar::MonthHorizon;
use crate::domain::catalog::{EntityDeclaration, SourceConventions};
use crate::domain::currency::CurrencyCode;
use crate::domain::measure::UnresolvedPolicy;

/// Storage format of the per-entity relational files.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    #[default]
    DuckDB,
    Sqlite,
}

/// What bronze does when a declared input is not on disk.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OnMissing {
    #[default]
    Skip,
    Abort,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum FxProviderKind {
    #[default]
    ExchangerateApi,
    Static,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "storage-root", default = "default_storage_root")]
    pub storage_root: String,

    #[serde(rename = "target-path", default = "default_target_path")]
    pub target_path: String,

    #[serde(rename = "clean-targets", default = "default_clean_targets")]
    pub clean_targets: Vec<String>,

    #[serde(rename = "reporting-currency", default = "default_reporting_currency")]
    pub reporting_currency: CurrencyCode,

    #[validate(nested)]
    #[serde(default)]
    pub sources: SourcesConfig,

    #[validate(nested)]
    #[serde(default)]
    pub columns: ColumnsConfig,

    #[serde(default)]
    pub calendar: MonthHorizon,

    #[validate(nested)]
    #[serde(default)]
    pub fx: FxConfig,

    #[validate(nested)]
    #[serde(default)]
    pub dimensions: DimensionsConfig,
}

impl ProjectConfig {
    /// Minimal configuration, used by tests and `Default`-style construction.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            storage_root: default_storage_root(),
            target_path: default_target_path(),
            clean_targets: default_clean_targets(),
            reporting_currency: default_reporting_currency(),
            sources: SourcesConfig::default(),
            columns: ColumnsConfig::default(),
            calendar: MonthHorizon::default(),
            fx: FxConfig::default(),
            dimensions: DimensionsConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct SourcesConfig {
    /// Satellite YAML file listing more entities (relative to the project dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    #[serde(default)]
    pub entities: Vec<EntityDeclaration>,

    #[serde(default)]
    pub format: SourceFormat,

    #[serde(default)]
    pub on_missing: OnMissing,

    #[validate(custom(function = "validate_conventions"))]
    #[serde(flatten)]
    pub conventions: SourceConventions,

    /// Convention mismatches and missing files become fatal.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct ColumnsConfig {
    #[validate(length(min = 1))]
    #[serde(default = "default_currency_column")]
    pub currency: String,
    #[validate(length(min = 1))]
    #[serde(default = "default_amount_local_column")]
    pub amount_local: String,
    #[validate(length(min = 1))]
    #[serde(default = "default_budget_amount_column")]
    pub budget_amount: String,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            currency: default_currency_column(),
            amount_local: default_amount_local_column(),
            budget_amount: default_budget_amount_column(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct FxConfig {
    #[serde(default)]
    pub provider: FxProviderKind,

    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Secret. Usually injected through `LEDGERFLOW_FX_API_KEY`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[validate(range(min = 0.001, message = "requests-per-second must be positive"))]
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    #[validate(range(min = 1))]
    #[serde(default = "default_burst")]
    pub burst: u32,

    #[validate(range(min = 1))]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Multipliers from a local currency to the reporting currency (`static` provider).
    #[serde(default)]
    pub static_rates: BTreeMap<String, f64>,

    #[serde(default)]
    pub unresolved_policy: UnresolvedPolicy,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            provider: FxProviderKind::default(),
            base_url: default_base_url(),
            api_key: None,
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            timeout_secs: default_timeout_secs(),
            static_rates: BTreeMap::new(),
            unresolved_policy: UnresolvedPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct DimensionsConfig {
    #[validate(custom(function = "validate_attribute_names"))]
    #[serde(default = "default_project_attributes")]
    pub project_attributes: Vec<String>,
}

impl Default for DimensionsConfig {
    fn default() -> Self {
        Self {
            project_attributes: default_project_attributes(),
        }
    }
}

fn validate_conventions(conventions: &SourceConventions) -> Result<(), ValidationError> {
    if regex::Regex::new(&conventions.code_pattern).is_err() {
        return Err(ValidationError::new("invalid_code_pattern"));
    }
    for pattern in [&conventions.database_pattern, &conventions.budget_pattern] {
        if !pattern.contains("{code}") {
            return Err(ValidationError::new("pattern_without_code_placeholder"));
        }
    }
    Ok(())
}

fn validate_attribute_names(attributes: &[String]) -> Result<(), ValidationError> {
    // These columns already exist on the fact.
    const RESERVED: [&str; 4] = ["entity_code", "date", "department", "category"];
    if attributes
        .iter()
        .any(|a| a.trim().is_empty() || RESERVED.contains(&a.as_str()))
    {
        return Err(ValidationError::new("reserved_or_empty_attribute"));
    }
    Ok(())
}

fn default_version() -> String {
    "1.0.0".to_string()
}
fn default_storage_root() -> String {
    "warehouse".to_string()
}
fn default_target_path() -> String {
    "target".to_string()
}
fn default_clean_targets() -> Vec<String> {
    vec!["target".to_string()]
}
fn default_reporting_currency() -> CurrencyCode {
    CurrencyCode::eur()
}
fn default_currency_column() -> String {
    "currency".to_string()
}
fn default_amount_local_column() -> String {
    "amount_local".to_string()
}
fn default_budget_amount_column() -> String {
    "budget_amount_reporting".to_string()
}
fn default_base_url() -> String {
    "https://v6.exchangerate-api.com/v6".to_string()
}
fn default_requests_per_second() -> f64 {
    1.0
}
fn default_burst() -> u32 {
    1
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_project_attributes() -> Vec<String> {
    vec!["country".to_string(), "name".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_defaults_from_minimal_yaml() -> Result<()> {
        let config: ProjectConfig = serde_yaml::from_str("name: demo\n")?;

        assert_eq!(config.reporting_currency.as_str(), "EUR");
        assert_eq!(config.storage_root, "warehouse");
        assert_eq!(config.sources.on_missing, OnMissing::Skip);
        assert_eq!(config.sources.conventions.database_pattern, "{code}.db");
        assert_eq!(config.columns.amount_local, "amount_local");
        assert_eq!(config.fx.unresolved_policy, UnresolvedPolicy::Null);
        assert_eq!(config.dimensions.project_attributes, vec!["country", "name"]);
        assert_eq!(config.calendar.len(), 36);
        config.validate()?;
        Ok(())
    }

    #[test]
    fn test_full_yaml() -> Result<()> {
        let yaml = r#"
name: finance
reporting-currency: usd
sources:
  format: sqlite
  on-missing: abort
  budget-pattern: "budgets/{code}.csv"
  strict: true
  entities:
    - code: BE01
    - code: KE02
      budget: KEO2_budget.csv
calendar:
  start: "2024-01"
  end: "2024-06"
fx:
  provider: static
  unresolved-policy: exclude
  static-rates:
    EUR: 1.1
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;

        assert_eq!(config.reporting_currency.as_str(), "USD");
        assert_eq!(config.sources.format, SourceFormat::Sqlite);
        assert_eq!(config.sources.on_missing, OnMissing::Abort);
        assert_eq!(config.sources.conventions.budget_for("BE01"), "budgets/BE01.csv");
        assert_eq!(config.sources.entities.len(), 2);
        assert_eq!(config.calendar.len(), 6);
        assert_eq!(config.fx.provider, FxProviderKind::Static);
        assert_eq!(config.fx.unresolved_policy, UnresolvedPolicy::Exclude);
        assert_eq!(config.fx.static_rates.get("EUR"), Some(&1.1));
        Ok(())
    }

    #[test]
    fn test_validation_rejects_bad_values() -> Result<()> {
        let mut config = ProjectConfig::new("demo");
        config.fx.requests_per_second = 0.0;
        assert!(config.validate().is_err());

        let mut config = ProjectConfig::new("demo");
        config.dimensions.project_attributes = vec!["entity_code".into()];
        assert!(config.validate().is_err());

        let mut config = ProjectConfig::new("demo");
        config.sources.conventions.budget_pattern = "budget.csv".into();
        assert!(config.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_reporting_currency_fails_parse() {
        let res: Result<ProjectConfig, _> =
            serde_yaml::from_str("name: demo\nreporting-currency: EURO\n");
        assert!(res.is_err());
    }

    #[test]
    fn test_api_key_never_serialized() -> Result<()> {
        let mut config = ProjectConfig::new("demo");
        config.fx.api_key = Some("secret-key".into());
        let out = serde_yaml::to_string(&config)?;
        assert!(!out.contains("secret-key"));
        Ok(())
    }
}
