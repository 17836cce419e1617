// ledgerflow/src/commands/mod.rs

pub mod catalog;
pub mod clean;
pub mod inspect;
pub mod run;
pub mod stage;

use anyhow::Context;
use std::path::Path;

use ledgerflow_core::domain::project::ProjectConfig;
use ledgerflow_core::infrastructure::config::load_project_config;

/// Shared by every command that touches the project.
pub(crate) fn load_config(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    println!("⚙️  Loading configuration...");
    let config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);
    tracing::debug!(dir = ?project_dir, storage_root = %config.storage_root, "Configuration loaded");
    Ok(config)
}
