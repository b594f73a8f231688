//! Pluggable remote history sources.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dlmm_core::api::HistoryApiClient;
use dlmm_core::types::{HistoricalDataset, Interval};
use dlmm_core::Result;

/// A remote provider of pool history.
///
/// Implementations return the same dataset shape the generator produces, or
/// an error. They must not retry internally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoricalDataSource: Send + Sync {
    /// Fetch history for `pool_address` over `[start, end)`.
    async fn fetch(
        &self,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<HistoricalDataset>;
}

#[async_trait]
impl HistoricalDataSource for HistoryApiClient {
    async fn fetch(
        &self,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<HistoricalDataset> {
        self.fetch_history(pool_address, start, end, interval).await
    }
}
