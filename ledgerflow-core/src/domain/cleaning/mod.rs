pub mod normalize;

pub use normalize::{normalize_label, title_case};
