//! Per-bin liquidity snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of bins that may be flagged active at one timestamp.
pub const MAX_ACTIVE_BINS: usize = 5;

/// Exclusive upper bound on a bin's fee rate.
pub const MAX_FEE_RATE: f64 = 0.1;

/// Liquidity held in a single DLMM bin at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityBinSnapshot {
    pub timestamp: DateTime<Utc>,
    pub bin_id: i32,
    /// X token reserves, serialized as a decimal string.
    pub liquidity_x: Decimal,
    /// Y token reserves, serialized as a decimal string.
    pub liquidity_y: Decimal,
    pub fee_rate: f64,
    /// Whether the bin sits in the concentrated range around the current price.
    pub is_active: bool,
    /// Fraction of the bin's liquidity used by swaps, in [0, 1].
    pub utilization_rate: f64,
    pub volume_24h: Decimal,
}

impl LiquidityBinSnapshot {
    /// Combined reserves of both sides.
    pub fn total_liquidity(&self) -> Decimal {
        self.liquidity_x + self.liquidity_y
    }

    /// Check positivity and rate bounds.
    pub fn is_consistent(&self) -> bool {
        self.liquidity_x > Decimal::ZERO
            && self.liquidity_y > Decimal::ZERO
            && self.fee_rate > 0.0
            && self.fee_rate < MAX_FEE_RATE
            && (0.0..=1.0).contains(&self.utilization_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liquidity_snapshot_serializes_decimals_as_strings() {
        let snapshot = LiquidityBinSnapshot {
            timestamp: Utc::now(),
            bin_id: -12,
            liquidity_x: Decimal::new(12345, 2),
            liquidity_y: Decimal::new(500, 0),
            fee_rate: 0.003,
            is_active: true,
            utilization_rate: 0.4,
            volume_24h: Decimal::new(1000, 0),
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["liquidityX"], "123.45");
        assert_eq!(value["binId"], -12);
        assert_eq!(value["isActive"], true);
        assert_eq!(snapshot.total_liquidity(), Decimal::new(62345, 2));
        assert!(snapshot.is_consistent());
    }

    #[test]
    fn test_fee_rate_bound() {
        let snapshot = LiquidityBinSnapshot {
            timestamp: Utc::now(),
            bin_id: 0,
            liquidity_x: Decimal::ONE,
            liquidity_y: Decimal::ONE,
            fee_rate: 0.1,
            is_active: false,
            utilization_rate: 0.0,
            volume_24h: Decimal::ZERO,
        };
        assert!(!snapshot.is_consistent());
    }
}
