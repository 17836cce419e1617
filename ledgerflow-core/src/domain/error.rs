// ledgerflow-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Input missing for entity {entity}: {kind} not found at '{path}'")]
    #[diagnostic(
        code(ledgerflow::domain::input_missing),
        help("Check the entity catalog (sources.entities) or set `on-missing: skip`.")
    )]
    InputMissing {
        entity: String,
        kind: String,
        path: String,
    },

    #[error("No source located for table '{0}'")]
    #[diagnostic(
        code(ledgerflow::domain::no_sources),
        help("At least one entity must provide this table.")
    )]
    NoSources(String),

    #[error("Period coercion failed on '{relation}': {invalid_rows} row(s) with invalid year/month (e.g. {samples})")]
    #[diagnostic(
        code(ledgerflow::domain::period),
        help("`year` and `month` must be integers, month in 1..=12.")
    )]
    PeriodCoercion {
        relation: String,
        invalid_rows: u64,
        samples: String,
    },

    #[error("Invalid entity catalog: {0}")]
    #[diagnostic(code(ledgerflow::domain::catalog))]
    CatalogInvalid(String),

    #[error("Invalid currency code '{0}'")]
    #[diagnostic(
        code(ledgerflow::domain::currency),
        help("Currency codes are three ASCII letters (ISO 4217), e.g. EUR.")
    )]
    InvalidCurrency(String),

    #[error("Invalid calendar horizon: {0}")]
    #[diagnostic(code(ledgerflow::domain::calendar))]
    InvalidHorizon(String),

    #[error("Artifact '{0}' not found in the store")]
    #[diagnostic(
        code(ledgerflow::domain::artifact_missing),
        help("Run the upstream stage first (bronze -> silver -> gold).")
    )]
    ArtifactMissing(String),

    #[error("Schema Error: {0}")]
    #[diagnostic(code(ledgerflow::domain::schema))]
    SchemaError(String),
}
