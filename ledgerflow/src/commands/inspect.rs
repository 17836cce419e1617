// ledgerflow/src/commands/inspect.rs
//
// USE CASE: Inspect a stored artifact (schema + sample rows).

use anyhow::Context;
use comfy_table::{Table, presets::UTF8_FULL};
use std::path::PathBuf;

use ledgerflow_core::application::PipelineContext;
use ledgerflow_core::domain::compiler::quoter::SqlQuoter;
use ledgerflow_core::domain::layer::Artifact;

pub async fn execute(project_dir: PathBuf, name: String, limit: usize) -> anyhow::Result<()> {
    let artifact = Artifact::parse(&name).with_context(|| {
        format!(
            "'{}' is not an artifact name (expected <layer>_<table>, ex: gold_fact)",
            name
        )
    })?;

    let config = super::load_config(&project_dir)?;
    let ctx = PipelineContext::open(&config, &project_dir)
        .context("Failed to open the DuckDB session")?;

    if !ctx.store.exists(&artifact) {
        anyhow::bail!(
            "❌ Artifact not found at: {}\n👉 Have you run 'ledgerflow {}'?",
            ctx.store.location(&artifact).display(),
            artifact.layer
        );
    }

    let view = ctx.store.read(&artifact).await?;
    let columns = ctx.connector.fetch_columns(&view).await?;
    let total = ctx
        .connector
        .query_scalar(&format!("SELECT COUNT(*) FROM {}", SqlQuoter::ident(&view)))
        .await?;

    println!("\n🔍 Inspecting Artifact: '{}' ({} rows)", name, total);
    for column in &columns {
        println!("   {} : {}", column.name, column.data_type);
    }

    let sample = ctx
        .connector
        .query_rows(&format!(
            "SELECT * FROM {} LIMIT {}",
            SqlQuoter::ident(&view),
            limit
        ))
        .await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(sample.columns.clone());
    for row in &sample.rows {
        table.add_row(row.iter().map(ToString::to_string).collect::<Vec<_>>());
    }
    println!("   --- Rows (Limit {}) ---", limit);
    println!("{table}");

    Ok(())
}
