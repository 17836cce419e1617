// ledgerflow-core/src/application/mod.rs

pub mod bronze;
pub mod clean;
pub mod context;
pub mod engine;
pub mod gold;
pub mod pipeline;
pub mod rates;
pub mod report;
pub mod silver;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Le CLI fait `use ledgerflow_core::application::{run_pipeline, PipelineContext};`

pub use bronze::run_bronze;
pub use clean::clean_project;
pub use context::StageContext;
pub use engine::execute_query;
pub use gold::run_gold;
pub use pipeline::{PipelineContext, run_pipeline};
pub use rates::RateResolver;
pub use report::{GoldAudit, RunResult, StageReport};
pub use silver::run_silver;
