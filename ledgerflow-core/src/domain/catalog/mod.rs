// ledgerflow-core/src/domain/catalog/mod.rs
//
// Data-driven catalog of source entities. Declared paths are configuration, hence
// untrusted: they are checked against the naming convention at load time.

pub mod entity;
pub mod validation;

pub use entity::{EntityCode, EntityDeclaration, EntitySource, SourceConventions};
pub use validation::{CatalogIssue, CatalogReport, EntityCatalog};
