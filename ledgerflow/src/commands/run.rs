// ledgerflow/src/commands/run.rs
//
// USE CASE: Run the whole pipeline.

use anyhow::Context;
use std::path::PathBuf;

use ledgerflow_core::application::{PipelineContext, run_pipeline};

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let config = super::load_config(&project_dir)?;
    println!(
        "   Reporting currency: {} | Entities: {}",
        config.reporting_currency,
        config.sources.entities.len()
    );

    let ctx = PipelineContext::open(&config, &project_dir)
        .context("Failed to open the DuckDB session")?;

    match run_pipeline(&ctx).await {
        Ok(run_res) => {
            if run_res.success {
                println!("\n✨ SUCCESS! Pipeline finished in {:.2?}", start.elapsed());
            } else {
                eprintln!(
                    "\n❌ FAILURE after {} layer(s): {}",
                    run_res.stages_executed,
                    run_res.errors.join("; ")
                );
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("\n💥 CRITICAL PIPELINE ERROR: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
