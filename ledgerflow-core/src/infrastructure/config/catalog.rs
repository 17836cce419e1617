// ledgerflow-core/src/infrastructure/config/catalog.rs

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::domain::catalog::{CatalogReport, EntityCatalog};
use crate::domain::project::ProjectConfig;
use crate::error::LedgerflowError;

/// Validated catalog plus the report of everything that was found suspicious.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: EntityCatalog,
    pub report: CatalogReport,
    /// Directory declared paths are relative to.
    pub base_dir: PathBuf,
}

impl LoadedCatalog {
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.base_dir.join(relative)
        }
    }
}

/// Builds the entity catalog from the configuration and checks that declared
/// files exist. Fatal issues (per `sources.strict`) fail the load; the others
/// are logged and kept in the report.
pub fn load_catalog(
    config: &ProjectConfig,
    project_dir: &Path,
) -> Result<LoadedCatalog, LedgerflowError> {
    let sources = &config.sources;
    let (catalog, mut report) = EntityCatalog::build(&sources.entities, &sources.conventions)?;
    report.issues.extend(catalog.check_presence(project_dir));

    for issue in report.warnings(sources.strict) {
        warn!(%issue, "Entity catalog");
    }
    let report = report.into_result(sources.strict)?;

    Ok(LoadedCatalog {
        catalog,
        report,
        base_dir: project_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CatalogIssue, EntityDeclaration};
    use crate::domain::error::DomainError;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn config_with(entities: Vec<EntityDeclaration>, strict: bool) -> ProjectConfig {
        let mut config = ProjectConfig::new("test");
        config.sources.entities = entities;
        config.sources.strict = strict;
        config
    }

    #[test]
    fn test_missing_files_are_warnings_by_default() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("BE01.db"), b"")?;
        let config = config_with(vec![EntityDeclaration::code_only("BE01")], false);

        let loaded = load_catalog(&config, dir.path())?;

        assert_eq!(loaded.catalog.len(), 1);
        assert!(matches!(
            loaded.report.issues.as_slice(),
            [CatalogIssue::MissingFile { kind, .. }] if kind == "budget"
        ));
        Ok(())
    }

    #[test]
    fn test_strict_mode_fails_on_missing_files() -> Result<()> {
        let dir = tempdir()?;
        let config = config_with(vec![EntityDeclaration::code_only("BE01")], true);

        let res = load_catalog(&config, dir.path());
        assert!(matches!(
            res,
            Err(LedgerflowError::Domain(DomainError::CatalogInvalid(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_resolve_relative_and_absolute() -> Result<()> {
        let dir = tempdir()?;
        let config = config_with(vec![EntityDeclaration::code_only("BE01")], false);
        let loaded = load_catalog(&config, dir.path())?;

        assert_eq!(loaded.resolve(Path::new("BE01.db")), dir.path().join("BE01.db"));
        let abs = dir.path().join("x.db");
        assert_eq!(loaded.resolve(&abs), abs);
        Ok(())
    }
}
