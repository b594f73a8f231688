//! Market Data
//!
//! Historical price and liquidity data for DLMM pools.
//!
//! # Features
//!
//! - **Generator**: seeded random-walk OHLCV bars and per-bin liquidity ladders
//! - **Dataset Cache**: bounded LRU cache with TTL expiry and hit statistics
//! - **Remote Sources**: pluggable `HistoricalDataSource` trait with an HTTP implementation
//! - **Service**: cache-first fetch with remote fallback to generation
//!
//! # Example
//!
//! ```ignore
//! use market_data::{HistoricalDataService, Interval};
//! use dlmm_core::config::HistoricalDataConfig;
//!
//! let service = HistoricalDataService::new(HistoricalDataConfig::from_env()?)?;
//! let data = service
//!     .fetch_historical_data(pool, start, end, Interval::OneHour)
//!     .await?;
//! println!("{} bars, coverage {:.0}%", data.price_data.len(), data.metadata.coverage * 100.0);
//! ```

pub mod cache;
pub mod generator;
pub mod service;
pub mod source;

// Re-exports
pub use cache::{CacheEntry, CacheEntryStats, CacheKey, CacheStats, DatasetCache};
pub use dlmm_core::types::{
    DataSource, DatasetMetadata, DatasetSummary, HistoricalDataset, Interval,
    LiquidityBinSnapshot, PricePoint,
};
pub use generator::{GeneratorConfig, MarketDataGenerator};
pub use service::HistoricalDataService;
pub use source::HistoricalDataSource;
