// ledgerflow-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerflowError {
    // --- ERREURS DU DOMAINE (catalogue, périodes, schémas) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- ERREURS D'INFRASTRUCTURE (IO, DuckDB, YAML, HTTP) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- ERREURS GÉNÉRIQUES / APPLICATIVES ---
    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    UnsafePath(String),
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for LedgerflowError {
    fn from(err: std::io::Error) -> Self {
        LedgerflowError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for LedgerflowError {
    fn from(err: duckdb::Error) -> Self {
        LedgerflowError::Infrastructure(InfrastructureError::from(err))
    }
}

impl LedgerflowError {
    /// True when the error reports a declared source artifact that does not exist.
    /// Callers use it to apply their skip-or-abort policy.
    pub fn is_input_missing(&self) -> bool {
        matches!(self, LedgerflowError::Domain(DomainError::InputMissing { .. }))
    }
}
