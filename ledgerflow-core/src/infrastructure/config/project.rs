// ledgerflow-core/src/infrastructure/config/project.rs

use serde::{Deserialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::catalog::EntityDeclaration;
use crate::domain::project::configuration::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

pub const ENV_STORAGE_ROOT: &str = "LEDGERFLOW_STORAGE_ROOT";
pub const ENV_TARGET_PATH: &str = "LEDGERFLOW_TARGET_PATH";
pub const ENV_FX_API_KEY: &str = "LEDGERFLOW_FX_API_KEY";

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    load_project_config_with_env(project_dir, |key| std::env::var(key).ok())
}

/// Same as `load_project_config`, with the environment lookup injected.
pub fn load_project_config_with_env<F>(
    project_dir: &Path,
    env: F,
) -> Result<ProjectConfig, InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. Découverte du fichier principal
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    // 2. Chargement YAML Base
    let mut config: ProjectConfig = load_fragment(&config_path)?;

    // 3. Catalogue satellite
    if let Some(catalog_file) = config.sources.catalog.clone() {
        let catalog_path = project_dir.join(&catalog_file);
        if !catalog_path.exists() {
            return Err(InfrastructureError::ConfigNotFound(
                catalog_path.display().to_string(),
            ));
        }
        merge_satellite_catalog(&mut config, &catalog_path)?;
    }

    // 4. Override via variables d'environnement (pattern 'Layering')
    apply_env_overrides(&mut config, env);

    config.validate()?;
    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["ledgerflow_project.yaml", "ledgerflow.yaml"];
    for filename in candidates {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, candidates
    )))
}

/// Charge un fragment YAML typé.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path).map_err(|e| {
        InfrastructureError::ConfigError(format!("Failed to read {:?}: {}", path, e))
    })?;
    Ok(serde_yaml::from_str(&content)?)
}

fn merge_satellite_catalog(
    config: &mut ProjectConfig,
    catalog_path: &Path,
) -> Result<(), InfrastructureError> {
    #[derive(Deserialize)]
    struct CatalogWrapper {
        #[serde(default)]
        entities: Vec<EntityDeclaration>,
    }

    let wrapper: CatalogWrapper = load_fragment(catalog_path)?;
    info!(
        path = ?catalog_path,
        count = wrapper.entities.len(),
        "  📇 Entity catalog loaded"
    );
    // Inline entries first; duplicates are reported by catalog validation.
    config.sources.entities.extend(wrapper.entities);
    Ok(())
}

fn apply_env_overrides<F>(config: &mut ProjectConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = env(ENV_STORAGE_ROOT) {
        info!(old = ?config.storage_root, new = ?val, "Overriding storage root via ENV");
        config.storage_root = val;
    }
    if let Some(val) = env(ENV_TARGET_PATH) {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Some(val) = env(ENV_FX_API_KEY) {
        // La valeur n'est jamais loggée
        info!("Using FX API key from ENV");
        config.fx.api_key = Some(val);
    }
}
