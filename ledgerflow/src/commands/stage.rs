// ledgerflow/src/commands/stage.rs
//
// USE CASE: Run a single layer.

use anyhow::Context;
use std::path::PathBuf;

use ledgerflow_core::application::PipelineContext;
use ledgerflow_core::domain::layer::Layer;

pub async fn execute(project_dir: PathBuf, layer: Layer) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let config = super::load_config(&project_dir)?;

    let ctx = PipelineContext::open(&config, &project_dir)
        .context("Failed to open the DuckDB session")?;

    match ctx.run_layer(layer).await {
        Ok(report) => {
            for artifact in &report.artifacts {
                println!("   📦 {} ({} rows)", artifact.name, artifact.rows);
            }
            for warning in &report.warnings {
                println!("   ⚠️  {}", warning);
            }
            println!(
                "\n✨ SUCCESS! Layer {} finished in {:.2?}",
                layer,
                start.elapsed()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("\n💥 Layer {} failed: {}", layer, e);
            std::process::exit(1);
        }
    }
}
