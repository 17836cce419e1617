// ledgerflow-core/src/domain/layer.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Medallion layers. Data flows strictly bronze -> silver -> gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Bronze,
    Silver,
    Gold,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Bronze, Layer::Silver, Layer::Gold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Bronze => "bronze",
            Layer::Silver => "silver",
            Layer::Gold => "gold",
        }
    }

    /// Directory holding this layer's artifacts, relative to the storage root.
    pub fn output_dir(&self) -> String {
        format!("{}_outputs", self.as_str())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, persisted table of one layer (`bronze_expenses`, `gold_fact`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub layer: Layer,
    pub table: String,
}

impl Artifact {
    pub fn new(layer: Layer, table: impl Into<String>) -> Self {
        Self {
            layer,
            table: table.into(),
        }
    }

    /// `{layer}_{table}`: the artifact name, also used as the relation name once read.
    pub fn qualified_name(&self) -> String {
        format!("{}_{}", self.layer.as_str(), self.table)
    }

    /// In-session table a stage builds before persisting it. Distinct from the
    /// read view so that several stages can share one connection.
    pub fn work_relation(&self) -> String {
        format!("work_{}", self.qualified_name())
    }

    /// Inverse of `qualified_name`.
    pub fn parse(name: &str) -> Option<Self> {
        Layer::ALL.iter().find_map(|layer| {
            name.strip_prefix(layer.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|table| !table.is_empty())
                .map(|table| Artifact::new(*layer, table))
        })
    }

    pub fn bronze_projects() -> Self {
        Self::new(Layer::Bronze, "projects")
    }
    pub fn bronze_expenses() -> Self {
        Self::new(Layer::Bronze, "expenses")
    }
    pub fn bronze_budgets() -> Self {
        Self::new(Layer::Bronze, "budgets")
    }
    pub fn silver_projects() -> Self {
        Self::new(Layer::Silver, "projects")
    }
    pub fn silver_expenses() -> Self {
        Self::new(Layer::Silver, "expenses")
    }
    pub fn silver_budgets() -> Self {
        Self::new(Layer::Silver, "budgets")
    }
    pub fn gold_fact() -> Self {
        Self::new(Layer::Gold, "fact")
    }
    pub fn gold_dim_date() -> Self {
        Self::new(Layer::Gold, "dim_date")
    }
    pub fn gold_dim_project() -> Self {
        Self::new(Layer::Gold, "dim_project")
    }
    pub fn gold_fx_rates() -> Self {
        Self::new(Layer::Gold, "fx_rates")
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}
