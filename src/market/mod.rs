//! Borough market data.
//!
//! Loads a flat borough dataset once per aggregator, falls back to an
//! embedded dataset when the primary source cannot be read, and serves
//! lookups and summary statistics over whatever was loaded.
//!
//! Defines the `DatasetSource` trait; file and HTTP sources live in
//! `source`, parsing in `parser`, presentation helpers in `format`.

pub mod aggregator;
pub mod fallback;
pub mod format;
pub mod parser;
pub mod source;

use anyhow::Result;
use async_trait::async_trait;

pub use aggregator::{summarize, LoadOutcome, LoadState, MarketDataAggregator};

/// Abstraction over where the raw borough dataset comes from.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch the whole dataset as delimited text.
    async fn fetch(&self) -> Result<String>;

    /// Human-readable location for logging.
    fn describe(&self) -> String;
}
