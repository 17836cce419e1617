// ledgerflow-core/src/infrastructure/adapters/parquet_store.rs

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::domain::compiler::SqlQuoter;
use crate::domain::error::DomainError;
use crate::domain::layer::{Artifact, Layer};
use crate::error::LedgerflowError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::temp_path_beside;
use crate::ports::artifact_store::{ArtifactInfo, ArtifactStore};
use crate::ports::connector::Connector;

/// Artifacts as Parquet files: `<root>/<layer>_outputs/<layer>_<table>.parquet`.
/// Reads and writes go through the SQL engine of the session.
pub struct ParquetStore {
    root: PathBuf,
    connector: Arc<dyn Connector>,
}

impl ParquetStore {
    pub fn new(root: impl Into<PathBuf>, connector: Arc<dyn Connector>) -> Self {
        Self {
            root: root.into(),
            connector,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn count_rows(&self, relation: &str) -> Result<u64, LedgerflowError> {
        self.connector
            .query_scalar(&format!("SELECT COUNT(*) FROM {}", relation))
            .await
    }
}

fn path_literal(path: &Path) -> String {
    SqlQuoter::literal(&path.to_string_lossy())
}

#[async_trait]
impl ArtifactStore for ParquetStore {
    #[instrument(skip(self), fields(artifact = %artifact))]
    async fn write(
        &self,
        artifact: &Artifact,
        relation: &str,
    ) -> Result<ArtifactInfo, LedgerflowError> {
        let target = self.location(artifact);
        let temp = temp_path_beside(&target)?;

        // Le moteur écrit le fichier temporaire, puis rename atomique
        self.connector
            .execute(&format!(
                "COPY (SELECT * FROM {}) TO {} (FORMAT PARQUET)",
                SqlQuoter::ident(relation),
                path_literal(&temp)
            ))
            .await?;
        temp.persist(&target)
            .map_err(|e| InfrastructureError::Io(e.error))?;

        let rows = self.count_rows(&SqlQuoter::ident(relation)).await?;
        debug!(path = ?target, rows, "Artifact persisted");

        Ok(ArtifactInfo {
            name: artifact.qualified_name(),
            layer: artifact.layer,
            path: target,
            rows,
        })
    }

    async fn read(&self, artifact: &Artifact) -> Result<String, LedgerflowError> {
        let path = self.location(artifact);
        if !path.exists() {
            return Err(DomainError::ArtifactMissing(artifact.qualified_name()).into());
        }

        let name = artifact.qualified_name();
        self.connector
            .execute(&format!(
                "CREATE OR REPLACE VIEW {} AS SELECT * FROM read_parquet({})",
                SqlQuoter::ident(&name),
                path_literal(&path)
            ))
            .await?;
        Ok(name)
    }

    async fn list(&self, layer: Option<Layer>) -> Result<Vec<ArtifactInfo>, LedgerflowError> {
        let layers: Vec<Layer> = match layer {
            Some(l) => vec![l],
            None => Layer::ALL.to_vec(),
        };

        let mut infos = Vec::new();
        for layer in layers {
            let dir = self.root.join(layer.output_dir());
            if !dir.exists() {
                continue;
            }
            for entry in WalkDir::new(&dir)
                .max_depth(1)
                .into_iter()
                .filter_map(Result::ok)
            {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("parquet") {
                    continue;
                }
                let Some(artifact) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(Artifact::parse)
                    .filter(|a| a.layer == layer)
                else {
                    continue;
                };
                let rows = self
                    .count_rows(&format!("read_parquet({})", path_literal(path)))
                    .await?;
                infos.push(ArtifactInfo {
                    name: artifact.qualified_name(),
                    layer,
                    path: path.to_path_buf(),
                    rows,
                });
            }
        }

        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    fn exists(&self, artifact: &Artifact) -> bool {
        self.location(artifact).exists()
    }

    fn location(&self, artifact: &Artifact) -> PathBuf {
        self.root
            .join(artifact.layer.output_dir())
            .join(format!("{}.parquet", artifact.qualified_name()))
    }
}
