pub mod quoter;

pub use quoter::SqlQuoter;
