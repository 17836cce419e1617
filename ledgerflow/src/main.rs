// ledgerflow/src/main.rs

use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use ledgerflow_core::domain::layer::Layer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug ledgerflow run ... pour voir les détails
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bronze { project_dir } => commands::stage::execute(project_dir, Layer::Bronze).await,
        Commands::Silver { project_dir } => commands::stage::execute(project_dir, Layer::Silver).await,
        Commands::Gold { project_dir } => commands::stage::execute(project_dir, Layer::Gold).await,
        Commands::Run { project_dir } => commands::run::execute(project_dir).await,
        Commands::Catalog { project_dir, check } => commands::catalog::execute(project_dir, check),
        Commands::Inspect {
            artifact,
            project_dir,
            limit,
        } => commands::inspect::execute(project_dir, artifact, limit).await,
        Commands::Clean { project_dir } => commands::clean::execute(project_dir),
    }
}
