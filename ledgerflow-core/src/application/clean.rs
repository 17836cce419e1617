// ledgerflow-core/src/application/clean.rs

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::domain::layer::Layer;
use crate::domain::project::ProjectConfig;
use crate::error::LedgerflowError;

/// Removes the layer output directories under the storage root and every
/// `clean-targets` entry. Returns what was removed.
pub fn clean_project(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<Vec<PathBuf>, LedgerflowError> {
    tracing::info!("🧹 Initializing cleanup sequence...");

    let mut candidates: Vec<String> = if config.clean_targets.is_empty() {
        vec![config.target_path.clone()]
    } else {
        config.clean_targets.clone()
    };
    for layer in Layer::ALL {
        candidates.push(format!("{}/{}", config.storage_root, layer.output_dir()));
    }

    let mut removed = Vec::new();
    for target_rel_path in candidates {
        let full_path = guarded_join(project_dir, &target_rel_path)?;

        if full_path.exists() {
            if full_path.is_dir() {
                fs::remove_dir_all(&full_path)?;
            } else {
                fs::remove_file(&full_path)?;
            }
            println!("   🗑️  Artifact removed: {}", target_rel_path);
            removed.push(full_path);
        }
    }

    Ok(removed)
}

/// Joins a configured relative path onto the project dir, refusing anything
/// that could leave it (absolute paths, `..`).
fn guarded_join(project_dir: &Path, relative: &str) -> Result<PathBuf, LedgerflowError> {
    let rel = Path::new(relative);
    let escapes = rel
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes || relative.trim().is_empty() {
        return Err(LedgerflowError::UnsafePath(relative.to_string()));
    }
    Ok(project_dir.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_clean_removes_outputs_and_target() -> Result<()> {
        let dir = tempdir()?;
        let config = ProjectConfig::new("demo");
        fs::create_dir_all(dir.path().join("warehouse/bronze_outputs"))?;
        fs::create_dir_all(dir.path().join("warehouse/gold_outputs"))?;
        fs::create_dir_all(dir.path().join("target"))?;
        fs::write(dir.path().join("warehouse/keep.txt"), "x")?;

        let removed = clean_project(dir.path(), &config)?;

        assert_eq!(removed.len(), 3);
        assert!(!dir.path().join("warehouse/gold_outputs").exists());
        assert!(dir.path().join("warehouse/keep.txt").exists());
        Ok(())
    }

    #[test]
    fn test_traversal_is_refused() -> Result<()> {
        let dir = tempdir()?;
        let mut config = ProjectConfig::new("demo");
        config.clean_targets = vec!["../outside".to_string()];

        let res = clean_project(dir.path(), &config);
        assert!(matches!(res, Err(LedgerflowError::UnsafePath(p)) if p == "../outside"));

        config.clean_targets = vec!["/etc".to_string()];
        assert!(clean_project(dir.path(), &config).is_err());
        Ok(())
    }
}
