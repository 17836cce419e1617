// ledgerflow-core/src/application/pipeline.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::application::bronze::run_bronze;
use crate::application::context::StageContext;
use crate::application::gold::run_gold;
use crate::application::report::{RunResult, StageReport};
use crate::application::silver::run_silver;
use crate::domain::layer::Layer;
use crate::domain::project::ProjectConfig;
use crate::error::LedgerflowError;
use crate::infrastructure::adapters::build_rate_provider;
use crate::infrastructure::adapters::duckdb::DuckDBConnector;
use crate::infrastructure::adapters::parquet_store::ParquetStore;
use crate::infrastructure::adapters::source_reader::DuckDbSourceReader;
use crate::infrastructure::config::load_catalog;
use crate::ports::artifact_store::ArtifactStore;
use crate::ports::connector::Connector;

/// Everything a stage run needs, wired once per invocation.
pub struct PipelineContext<'a> {
    pub config: &'a ProjectConfig,
    pub project_dir: &'a Path,
    pub connector: Arc<dyn Connector>,
    pub store: Arc<dyn ArtifactStore>,
}

impl<'a> PipelineContext<'a> {
    /// In-memory DuckDB session over the Parquet store of the project.
    pub fn open(config: &'a ProjectConfig, project_dir: &'a Path) -> Result<Self, LedgerflowError> {
        let connector: Arc<dyn Connector> = Arc::new(DuckDBConnector::in_memory()?);
        let stage = StageContext::new(config, project_dir);
        let store: Arc<dyn ArtifactStore> =
            Arc::new(ParquetStore::new(stage.storage_root(), connector.clone()));
        Ok(Self {
            config,
            project_dir,
            connector,
            store,
        })
    }

    pub fn stage(&self) -> StageContext<'a> {
        StageContext::new(self.config, self.project_dir)
    }

    /// Runs a single layer.
    pub async fn run_layer(&self, layer: Layer) -> Result<StageReport, LedgerflowError> {
        let stage = self.stage();
        fs::create_dir_all(stage.target_dir())?;

        match layer {
            Layer::Bronze => {
                let catalog = load_catalog(self.config, self.project_dir)?;
                let reader =
                    DuckDbSourceReader::new(self.connector.clone(), self.config.sources.format);
                run_bronze(
                    &stage,
                    &catalog,
                    self.connector.as_ref(),
                    &reader,
                    self.store.as_ref(),
                )
                .await
            }
            Layer::Silver => run_silver(&stage, self.connector.as_ref(), self.store.as_ref()).await,
            Layer::Gold => {
                let provider = build_rate_provider(self.config)?;
                run_gold(
                    &stage,
                    self.connector.as_ref(),
                    self.store.as_ref(),
                    provider.as_ref(),
                )
                .await
            }
        }
    }
}

/// bronze -> silver -> gold. Stops at the first failing layer; artifacts of the
/// layers already written stay in place. Writes `run_results.json` either way.
pub async fn run_pipeline(ctx: &PipelineContext<'_>) -> Result<RunResult, LedgerflowError> {
    println!("🚀 Starting Pipeline Orchestrator...");
    let start_time = Instant::now();
    let target_dir = ctx.stage().target_dir();

    let mut stages = Vec::new();
    let mut errors = Vec::new();

    for layer in Layer::ALL {
        match ctx.run_layer(layer).await {
            Ok(report) => {
                println!("    ✅ Layer {} done", layer);
                stages.push(report);
            }
            Err(e) => {
                eprintln!("    ❌ Error in layer {}: {}", layer, e);
                errors.push(format!("{}: {}", layer, e));
                break;
            }
        }
    }

    let result = RunResult {
        success: errors.is_empty(),
        stages_executed: stages.len(),
        duration_ms: start_time.elapsed().as_millis(),
        errors,
        stages,
    };
    fs::create_dir_all(&target_dir)?;
    result.save(&target_dir)?;

    println!(
        "✨ Done in {:.2}s. Executed {} layers.",
        start_time.elapsed().as_secs_f64(),
        result.stages_executed
    );
    Ok(result)
}
