// ledgerflow-core/src/lib.rs

// 1. Mandatory documentation for production code
#![allow(missing_docs)] // On autorise le manque de doc pour le moment

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- MODULES HEXAGONAUX ---

// 1. Ports (Interfaces / Traits)
// Contrats: Connector, ArtifactStore, SourceReader, RateProvider
pub mod ports;

// 2. Domain (Cœur du métier)
// Catalogue d'entités, devises, calendrier, normalisation...
// Ne dépend de RIEN d'autre (ni infra, ni app).
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB, Parquet, HTTP provider, fichiers de config
pub mod infrastructure;

// 4. Application (Use Cases)
// Bronze -> Silver -> Gold, résolution des taux, rapports
pub mod application;

// --- GESTION DES ERREURS GLOBALE ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use ledgerflow_core::LedgerflowError;
pub use error::LedgerflowError;
