// ledgerflow-core/src/domain/project/mod.rs

pub mod configuration;
pub use configuration::{
    ColumnsConfig, DimensionsConfig, FxConfig, FxProviderKind, OnMissing, ProjectConfig,
    SourceFormat, SourcesConfig,
};
