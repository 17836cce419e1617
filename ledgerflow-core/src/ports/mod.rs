// ledgerflow-core/src/ports/mod.rs

// Contrats techniques. Le domaine et l'application ne connaissent que ces traits.

pub mod artifact_store;
pub mod connector;
pub mod rate_provider;
pub mod source_reader;
