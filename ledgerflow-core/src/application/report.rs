// ledgerflow-core/src/application/report.rs

use serde::Serialize;
use std::path::Path;

use crate::domain::currency::{RateResolution, RateTable};
use crate::domain::layer::Layer;
use crate::error::LedgerflowError;
use crate::infrastructure::fs::atomic_write_json;
use crate::ports::artifact_store::ArtifactInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputStatus {
    Loaded,
    Missing,
}

/// What happened to one input of one entity during bronze.
#[derive(Debug, Clone, Serialize)]
pub struct EntityOutcome {
    pub entity: String,
    pub input: String,
    pub status: InputStatus,
    pub rows: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyOutcome {
    pub currency: String,
    #[serde(flatten)]
    pub resolution: RateResolution,
}

impl CurrencyOutcome {
    pub fn from_table(table: &RateTable) -> Vec<Self> {
        table
            .iter()
            .map(|(code, resolution)| CurrencyOutcome {
                currency: code.clone(),
                resolution: resolution.clone(),
            })
            .collect()
    }
}

/// Counts that explain every NULL or partial measure in the gold fact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoldAudit {
    pub fact_rows: u64,
    pub unresolved_currencies: Vec<String>,
    pub unresolved_expense_rows: u64,
    /// Expense rows with a resolved currency but a NULL amount.
    pub invalid_amount_rows: u64,
    pub null_expense_rows: u64,
    pub excluded_expense_rows: u64,
    pub orphan_entity_rows: u64,
    pub rows_outside_calendar: u64,
    pub dim_project_conflicts: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub layer: Layer,
    pub started_at: String,
    pub duration_ms: u128,
    pub artifacts: Vec<ArtifactInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntityOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub currencies: Vec<CurrencyOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<GoldAudit>,
    pub warnings: Vec<String>,
}

impl StageReport {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            started_at: chrono::Utc::now().to_rfc3339(),
            duration_ms: 0,
            artifacts: Vec::new(),
            entities: Vec::new(),
            currencies: Vec::new(),
            audit: None,
            warnings: Vec::new(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_report.json", self.layer.as_str())
    }

    pub fn save(&self, target_dir: &Path) -> Result<(), LedgerflowError> {
        atomic_write_json(target_dir.join(self.file_name()), self)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub stages_executed: usize,
    pub duration_ms: u128,
    pub errors: Vec<String>,
    pub stages: Vec<StageReport>,
}

impl RunResult {
    pub fn save(&self, target_dir: &Path) -> Result<(), LedgerflowError> {
        atomic_write_json(target_dir.join("run_results.json"), self)?;
        Ok(())
    }
}
