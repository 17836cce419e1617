pub mod code;
pub mod limiter;
pub mod rates;

pub use code::CurrencyCode;
pub use limiter::TokenBucket;
pub use rates::{RateResolution, RateSource, RateTable, UnresolvedReason};
