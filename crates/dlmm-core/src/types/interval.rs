//! Candle interval buckets.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::Error;

/// Aggregation interval for a historical series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    /// All supported intervals, shortest first.
    pub const ALL: [Interval; 6] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::OneHour,
        Interval::FourHours,
        Interval::OneDay,
    ];

    /// Get the interval as a chrono Duration.
    pub fn duration(&self) -> Duration {
        match self {
            Interval::OneMinute => Duration::minutes(1),
            Interval::FiveMinutes => Duration::minutes(5),
            Interval::FifteenMinutes => Duration::minutes(15),
            Interval::OneHour => Duration::hours(1),
            Interval::FourHours => Duration::hours(4),
            Interval::OneDay => Duration::days(1),
        }
    }

    /// Interval length in milliseconds.
    pub fn millis(&self) -> i64 {
        self.duration().num_milliseconds()
    }

    /// Interval length in hours, fractional for sub-hour buckets.
    pub fn hours(&self) -> f64 {
        self.millis() as f64 / 3_600_000.0
    }

    /// Wire label, e.g. `"15m"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }

    /// Parse a label, falling back to one hour for anything unrecognized.
    pub fn parse_or_default(label: &str) -> Self {
        label.parse().unwrap_or_else(|_| {
            warn!(interval = label, "Unknown interval, defaulting to 1h");
            Interval::OneHour
        })
    }

    /// Number of buckets needed to cover `span_ms`, rounding up.
    pub fn expected_points(&self, span_ms: i64) -> usize {
        if span_ms <= 0 {
            return 0;
        }
        let step = self.millis();
        ((span_ms + step - 1) / step) as usize
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| Error::InvalidInterval(s.to_string()))
    }
}
