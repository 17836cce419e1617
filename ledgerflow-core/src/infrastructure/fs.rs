// ledgerflow-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;

/// Write content to a file atomically: the bytes go to a temporary file in the
/// target directory, which is then renamed over the target.
///
/// Missing parent directories are created.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let mut temp_file = tempfile::NamedTempFile::new_in(ensure_parent(path)?)?;

    temp_file.write_all(content.as_ref())?;
    temp_file.flush()?;

    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Pretty JSON variant of `atomic_write`, used for run reports.
pub fn atomic_write_json<P: AsRef<Path>, T: Serialize>(
    path: P,
    value: &T,
) -> Result<(), InfrastructureError> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| InfrastructureError::ConfigError(format!("JSON serialization: {}", e)))?;
    atomic_write(path, content)
}

/// Reserves a temporary path next to `target` for a writer that is not a Rust
/// handle (the SQL engine). The caller fills it, then calls `TempPath::persist`.
/// Dropped without persisting, the file is removed.
pub fn temp_path_beside(target: &Path) -> Result<TempPath, InfrastructureError> {
    let parent = ensure_parent(target)?;
    let temp = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".parquet")
        .tempfile_in(parent)?;
    Ok(temp.into_temp_path())
}

fn ensure_parent(path: &Path) -> Result<&Path, InfrastructureError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.exists() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(parent)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("target").join("bronze_report.json");

        atomic_write(&file_path, "{}")?;

        assert_eq!(fs::read_to_string(file_path)?, "{}");
        Ok(())
    }

    #[test]
    fn test_atomic_write_overwrites_existing() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("report.json");

        atomic_write(&file_path, "Initial")?;
        atomic_write(&file_path, "Updated")?;

        assert_eq!(fs::read_to_string(&file_path)?, "Updated");
        // No temporary file left behind
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_atomic_write_json() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("run_results.json");

        atomic_write_json(&file_path, &serde_json::json!({ "success": true }))?;

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(file_path)?)?;
        assert_eq!(value["success"], true);
        Ok(())
    }

    #[test]
    fn test_temp_path_removed_unless_persisted() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("gold_outputs").join("gold_fact.parquet");

        let dropped = temp_path_beside(&target)?;
        let dropped_path = dropped.to_path_buf();
        drop(dropped);
        assert!(!dropped_path.exists());

        let kept = temp_path_beside(&target)?;
        fs::write(&kept, b"PAR1")?;
        kept.persist(&target)?;
        assert!(target.exists());
        Ok(())
    }
}
