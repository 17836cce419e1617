// ledgerflow-core/src/ports/artifact_store.rs

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

use crate::domain::layer::{Artifact, Layer};
use crate::error::LedgerflowError;

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub layer: Layer,
    pub path: PathBuf,
    pub rows: u64,
}

/// Persistent, named tables shared between layers.
///
/// `write` replaces the whole artifact atomically: a reader sees the previous
/// version or the new one, never a partial file.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persists the in-session relation `relation` as `artifact`.
    async fn write(&self, artifact: &Artifact, relation: &str)
    -> Result<ArtifactInfo, LedgerflowError>;

    /// Exposes the artifact in the session under its qualified name and returns that name.
    async fn read(&self, artifact: &Artifact) -> Result<String, LedgerflowError>;

    /// Artifacts currently stored, optionally for one layer, sorted by name.
    async fn list(&self, layer: Option<Layer>) -> Result<Vec<ArtifactInfo>, LedgerflowError>;

    fn exists(&self, artifact: &Artifact) -> bool;

    fn location(&self, artifact: &Artifact) -> PathBuf;
}
