// ledgerflow-core/src/ports/source_reader.rs

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use crate::domain::catalog::EntityCode;
use crate::error::LedgerflowError;

/// A per-entity extract loaded into the session, tagged with `entity_code`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedRelation {
    pub relation: String,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationalExtract {
    pub projects: StagedRelation,
    pub expenses: StagedRelation,
}

/// Reads one entity's raw inputs. Sources are read-only.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Stages the fixed `project` and `expenses` tables of the entity's relational store.
    async fn stage_relational(
        &self,
        entity: &EntityCode,
        path: &Path,
    ) -> Result<RelationalExtract, LedgerflowError>;

    /// Stages the entity's budget flat file.
    async fn stage_budget(
        &self,
        entity: &EntityCode,
        path: &Path,
    ) -> Result<StagedRelation, LedgerflowError>;
}
