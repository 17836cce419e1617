// ledgerflow-core/src/application/context.rs

use std::path::{Path, PathBuf};

use crate::domain::project::ProjectConfig;

/// Per-run, read-only inputs shared by every stage. Built once, passed by reference.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub config: &'a ProjectConfig,
    pub project_dir: &'a Path,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a ProjectConfig, project_dir: &'a Path) -> Self {
        Self { config, project_dir }
    }

    fn resolve(&self, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    pub fn storage_root(&self) -> PathBuf {
        self.resolve(&self.config.storage_root)
    }

    pub fn target_dir(&self) -> PathBuf {
        self.resolve(&self.config.target_path)
    }
}
