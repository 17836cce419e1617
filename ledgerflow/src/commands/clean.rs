// ledgerflow/src/commands/clean.rs
//
// USE CASE: Remove layer outputs and build artifacts.

use std::path::PathBuf;

use ledgerflow_core::application::clean_project;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = super::load_config(&project_dir)?;
    match clean_project(&project_dir, &config) {
        Ok(removed) if removed.is_empty() => println!("✨ Nothing to clean."),
        Ok(removed) => println!("✨ Removed {} path(s).", removed.len()),
        Err(e) => {
            eprintln!("❌ Clean failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
