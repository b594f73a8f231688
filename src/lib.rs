//! DLMM Dashboard: historical market data layer
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the workspace crates. For actual functionality, use them directly:
//!
//! - `dlmm-core`: Domain types, configuration, error type, history API client
//! - `market-data`: Synthetic generator, dataset cache, historical data service

// Re-export for benchmarks
pub use dlmm_core as core;
pub use market_data as data;
