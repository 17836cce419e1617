pub mod calendar;
pub mod catalog;
pub mod cleaning;
pub mod compiler;
pub mod currency;
pub mod error;
pub mod layer;
pub mod measure;
pub mod project;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
