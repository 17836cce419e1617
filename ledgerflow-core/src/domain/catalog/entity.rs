// ledgerflow-core/src/domain/catalog/entity.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of one source project (e.g. `BE01`). Validated by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityCode(String);

impl EntityCode {
    pub(crate) fn new_unchecked(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry as written in the configuration. Paths are optional and default
/// to the naming convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityDeclaration {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
}

impl EntityDeclaration {
    pub fn code_only(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            database: None,
            budget: None,
        }
    }
}

/// Naming convention for source artifacts. `{code}` is replaced by the entity code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConventions {
    #[serde(default = "default_code_pattern")]
    pub code_pattern: String,
    #[serde(default = "default_database_pattern")]
    pub database_pattern: String,
    #[serde(default = "default_budget_pattern")]
    pub budget_pattern: String,
}

impl SourceConventions {
    pub fn database_for(&self, code: &str) -> String {
        self.database_pattern.replace("{code}", code)
    }

    pub fn budget_for(&self, code: &str) -> String {
        self.budget_pattern.replace("{code}", code)
    }
}

impl Default for SourceConventions {
    fn default() -> Self {
        Self {
            code_pattern: default_code_pattern(),
            database_pattern: default_database_pattern(),
            budget_pattern: default_budget_pattern(),
        }
    }
}

fn default_code_pattern() -> String {
    "^[A-Z]{2}[0-9]{2}$".to_string()
}
fn default_database_pattern() -> String {
    "{code}.db".to_string()
}
fn default_budget_pattern() -> String {
    "{code}_budget.csv".to_string()
}

/// A validated catalog entry with its resolved paths (relative to the project).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySource {
    pub code: EntityCode,
    pub database: PathBuf,
    pub budget: PathBuf,
}
