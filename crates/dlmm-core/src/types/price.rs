//! OHLCV price bars.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar for a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// Bar open time.
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Total traded volume during the bar.
    pub volume: Decimal,
    /// Portion of the volume traded on the X side.
    pub volume_x: Decimal,
    /// Portion of the volume traded on the Y side.
    pub volume_y: Decimal,
}

impl PricePoint {
    /// Check the OHLC ordering, positivity and volume split of this bar.
    pub fn is_consistent(&self) -> bool {
        let positive = self.open > Decimal::ZERO
            && self.high > Decimal::ZERO
            && self.low > Decimal::ZERO
            && self.close > Decimal::ZERO;
        let ordered =
            self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close);

        positive && ordered && self.volume_split_within(Decimal::new(10, 2))
    }

    /// Whether `volume_x + volume_y` is within `tolerance` (a fraction) of `volume`.
    pub fn volume_split_within(&self, tolerance: Decimal) -> bool {
        let diff = (self.volume_x + self.volume_y - self.volume).abs();
        diff <= self.volume.abs() * tolerance
    }

    /// High-low range relative to close.
    pub fn range_pct(&self) -> Decimal {
        if self.close.is_zero() {
            return Decimal::ZERO;
        }
        (self.high - self.low) / self.close
    }

    /// Signed close-to-open move relative to open.
    pub fn change_pct(&self) -> Decimal {
        if self.open.is_zero() {
            return Decimal::ZERO;
        }
        (self.close - self.open) / self.open
    }
}
