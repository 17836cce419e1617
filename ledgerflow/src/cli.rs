// ledgerflow/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledgerflow")]
#[command(about = "Multi-entity budget & expense consolidation (bronze -> silver -> gold)", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🥉 Ingests every entity source into the bronze layer
    Bronze {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🥈 Cleans bronze into typed, period-dated silver tables
    Silver {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🥇 Builds the consolidated fact and dimensions in the reporting currency
    Gold {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🚀 Runs bronze, silver and gold in sequence
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 📒 Lists the entity catalog with file presence and validation issues
    Catalog {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Exit with error if the catalog has fatal issues
        #[arg(long)]
        check: bool,
    },

    /// 🔍 Inspects an artifact (schema + sample rows)
    Inspect {
        /// Artifact name (ex: "gold_fact")
        artifact: String,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Number of sample rows to display
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// 🧹 Removes layer outputs and build artifacts
    Clean {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_run_defaults() -> Result<()> {
        let args = Cli::parse_from(["ledgerflow", "run"]);
        match args.command {
            Commands::Run { project_dir } => {
                assert_eq!(project_dir.to_string_lossy(), ".");
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_single_layer() -> Result<()> {
        let args = Cli::parse_from(["ledgerflow", "silver", "--project-dir", "/tmp/finance"]);
        match args.command {
            Commands::Silver { project_dir } => {
                assert_eq!(project_dir.to_string_lossy(), "/tmp/finance");
                Ok(())
            }
            _ => bail!("Expected Silver command"),
        }
    }

    #[test]
    fn test_cli_parse_catalog_check() -> Result<()> {
        let args = Cli::parse_from(["ledgerflow", "catalog", "--check"]);
        match args.command {
            Commands::Catalog { check, .. } => {
                assert!(check);
                Ok(())
            }
            _ => bail!("Expected Catalog command"),
        }
    }

    #[test]
    fn test_cli_parse_inspect() -> Result<()> {
        let args = Cli::parse_from(["ledgerflow", "inspect", "gold_fact", "--limit", "10"]);
        match args.command {
            Commands::Inspect {
                artifact,
                limit,
                project_dir,
            } => {
                assert_eq!(artifact, "gold_fact");
                assert_eq!(limit, 10);
                assert_eq!(project_dir.to_string_lossy(), ".");
                Ok(())
            }
            _ => bail!("Expected Inspect command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_layer() {
        assert!(Cli::try_parse_from(["ledgerflow", "platinum"]).is_err());
    }
}
