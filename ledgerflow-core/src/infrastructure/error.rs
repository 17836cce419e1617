// ledgerflow-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- SQL ENGINE ---
    #[error("DuckDB session failed: {0}")]
    #[diagnostic(
        code(ledgerflow::infra::duckdb),
        help("Run with RUST_LOG=debug to see the statement that failed.")
    )]
    Engine(#[from] duckdb::Error),

    #[error("Cannot read SQLite source: {0}")]
    #[diagnostic(
        code(ledgerflow::infra::sqlite),
        help("Check that the entity database is a SQLite file, or set sources.format: duckdb.")
    )]
    Sqlite(#[from] rusqlite::Error),

    // --- FILESYSTEM ---
    #[error("I/O failure: {0}")]
    #[diagnostic(
        code(ledgerflow::infra::io),
        help("Check that the storage root and target path are writable.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG ---
    #[error("Cannot parse YAML: {0}")]
    #[diagnostic(
        code(ledgerflow::infra::yaml),
        help("Keys are kebab-case (reporting-currency, on-missing, static-rates...).")
    )]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(ledgerflow::infra::config))]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(ledgerflow::infra::config_invalid),
        help("Check the value ranges in ledgerflow.yaml.")
    )]
    Validation(#[from] validator::ValidationErrors),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(
        code(ledgerflow::infra::config_missing),
        help("Expected ledgerflow_project.yaml or ledgerflow.yaml in the project directory.")
    )]
    ConfigNotFound(String),

    // --- HTTP ---
    #[error("Cannot build the HTTP client: {0}")]
    #[diagnostic(code(ledgerflow::infra::http))]
    Http(#[from] reqwest::Error),
}
