pub mod aggregator;
pub mod catalog;
pub mod engine;
pub mod extractor;
pub mod resolver;
pub mod retry;
pub mod rewrite;
pub mod scheduler;

pub use crate::domain::model::{OfferQuote, ProbeResult, ProbeTarget, RawOfferDocument};
pub use crate::domain::ports::{ConfigProvider, OfferSource, Storage};
pub use crate::utils::error::Result;
