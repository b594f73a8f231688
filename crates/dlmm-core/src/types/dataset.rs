//! Historical dataset returned for a pool/range/interval request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Interval, LiquidityBinSnapshot, PricePoint};

/// Where a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Synthesized locally.
    Mock,
    /// Fetched from the remote history endpoint.
    Api,
}

/// Provenance and completeness of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub source: DataSource,
    /// Fraction of the expected buckets that are present, in [0, 1].
    pub coverage: f64,
    pub data_points: usize,
    pub generated_at: DateTime<Utc>,
}

/// Price and liquidity history for one pool over a time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataset {
    pub pool_address: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub interval: Interval,
    /// Chronological, one bar per interval.
    pub price_data: Vec<PricePoint>,
    /// Bins grouped by timestamp, chronological.
    pub liquidity_data: Vec<LiquidityBinSnapshot>,
    pub metadata: DatasetMetadata,
}

/// Aggregate view over a dataset's price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub total_volume: Decimal,
    /// Close-over-open change for the whole period.
    pub price_change_pct: Decimal,
    /// Volume-weighted average close.
    pub vwap: Decimal,
}

impl HistoricalDataset {
    /// Number of buckets the requested range should contain.
    pub fn expected_points(&self) -> usize {
        let span = (self.end_time - self.start_time).num_milliseconds();
        self.interval.expected_points(span)
    }

    /// Whether the price series is empty.
    pub fn is_empty(&self) -> bool {
        self.price_data.is_empty()
    }

    /// Summarize the price series. Returns `None` for an empty dataset.
    pub fn summary(&self) -> Option<DatasetSummary> {
        let first = self.price_data.first()?;
        let last = self.price_data.last()?;

        let mut high = first.high;
        let mut low = first.low;
        let mut total_volume = Decimal::ZERO;
        let mut weighted = Decimal::ZERO;

        for point in &self.price_data {
            high = high.max(point.high);
            low = low.min(point.low);
            total_volume += point.volume;
            weighted += point.close * point.volume;
        }

        let vwap = if total_volume.is_zero() {
            last.close
        } else {
            weighted / total_volume
        };
        let price_change_pct = if first.open.is_zero() {
            Decimal::ZERO
        } else {
            (last.close - first.open) / first.open
        };

        Some(DatasetSummary {
            open: first.open,
            close: last.close,
            high,
            low,
            total_volume,
            price_change_pct,
            vwap,
        })
    }

    /// Active bins recorded at `timestamp`.
    pub fn active_bins_at(
        &self,
        timestamp: DateTime<Utc>,
    ) -> impl Iterator<Item = &LiquidityBinSnapshot> {
        self.liquidity_data
            .iter()
            .filter(move |b| b.timestamp == timestamp && b.is_active)
    }

    /// Approximate in-memory footprint, measured as the JSON encoding length.
    pub fn estimated_size_bytes(&self) -> usize {
        serde_json::to_vec(self).map(|b| b.len()).unwrap_or(0)
    }
}
