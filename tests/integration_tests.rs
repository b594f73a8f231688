//! Integration tests for component interactions.
//!
//! These tests drive the historical data service end to end through the
//! public API of the workspace crates.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dlmm_core::config::HistoricalDataConfig;
use dlmm_core::types::{DataSource, HistoricalDataset, Interval};
use market_data::{HistoricalDataService, HistoricalDataSource};
use mockall::mock;
use rust_decimal::Decimal;
use std::sync::Arc;

mock! {
    pub Source {}

    #[async_trait]
    impl HistoricalDataSource for Source {
        async fn fetch(
            &self,
            pool_address: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
            interval: Interval,
        ) -> dlmm_core::Result<HistoricalDataset>;
    }
}

const POOL_X: &str = "5rCf1DM8LjKTw4YqhnoLcngyZYeNnQqztScTogYHAS6";

fn jan_1() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn seeded(config: HistoricalDataConfig) -> HistoricalDataService {
    HistoricalDataService::new(config)
        .expect("valid config")
        .with_seed(2024)
}

/// One day of hourly bars from generation.
#[tokio::test]
async fn test_hourly_day_from_mock() -> anyhow::Result<()> {
    let service = seeded(HistoricalDataConfig::default());
    let data = service
        .fetch_historical_data(POOL_X, jan_1(), jan_1() + Duration::days(1), Interval::OneHour)
        .await?;

    assert_eq!(data.price_data.len(), 24);
    assert_eq!(data.metadata.coverage, 1.0);
    assert_eq!(data.metadata.source, DataSource::Mock);
    assert_eq!(data.metadata.data_points, 24);
    assert_eq!(data.pool_address, POOL_X);
    Ok(())
}

/// A week of daily bars.
#[tokio::test]
async fn test_daily_week() -> anyhow::Result<()> {
    let service = seeded(HistoricalDataConfig::default());
    let data = service
        .fetch_historical_data(POOL_X, jan_1(), jan_1() + Duration::days(7), Interval::OneDay)
        .await?;
    assert_eq!(data.price_data.len(), 7);
    Ok(())
}

/// OHLC ordering, positivity, continuity, spacing and volume split hold for
/// every interval.
#[tokio::test]
async fn test_series_invariants_across_intervals() -> anyhow::Result<()> {
    let service = seeded(HistoricalDataConfig::default());

    for interval in Interval::ALL {
        let end = jan_1() + interval.duration() * 120;
        let data = service
            .fetch_historical_data(POOL_X, jan_1(), end, interval)
            .await?;
        assert_eq!(data.price_data.len(), 120);

        for point in &data.price_data {
            assert!(point.high >= point.open.max(point.close));
            assert!(point.low <= point.open.min(point.close));
            assert!(point.low > Decimal::ZERO);
            assert!(point.volume_split_within(Decimal::new(10, 2)));
        }
        for pair in data.price_data.windows(2) {
            assert_eq!(pair[1].open, pair[0].close);
            assert_eq!(
                (pair[1].timestamp - pair[0].timestamp).num_milliseconds(),
                interval.millis()
            );
        }
        for bin in &data.liquidity_data {
            assert!(bin.fee_rate > 0.0 && bin.fee_rate < 0.1);
            assert!(bin.liquidity_x > Decimal::ZERO && bin.liquidity_y > Decimal::ZERO);
        }
    }
    Ok(())
}

/// Repeated identical requests are byte-equal and count one hit each.
#[tokio::test]
async fn test_cache_hits_are_byte_equal() -> anyhow::Result<()> {
    let service = seeded(HistoricalDataConfig::default());
    let end = jan_1() + Duration::days(1);

    let first = service
        .fetch_historical_data(POOL_X, jan_1(), end, Interval::FifteenMinutes)
        .await?;
    let first_bytes = serde_json::to_vec(&*first)?;

    for hits in 1..=5u64 {
        let again = service
            .fetch_historical_data(POOL_X, jan_1(), end, Interval::FifteenMinutes)
            .await?;
        assert_eq!(serde_json::to_vec(&*again)?, first_bytes);

        let stats = service.get_cache_stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.total_hits, hits);
        assert_eq!(stats.entries[0].hits, hits);
    }
    Ok(())
}

/// Clearing resets entries and hit counters.
#[tokio::test]
async fn test_clear_cache_resets_stats() -> anyhow::Result<()> {
    let service = seeded(HistoricalDataConfig::default());
    let end = jan_1() + Duration::hours(6);
    service
        .fetch_historical_data(POOL_X, jan_1(), end, Interval::OneHour)
        .await?;
    service
        .fetch_historical_data(POOL_X, jan_1(), end, Interval::OneHour)
        .await?;
    assert_eq!(service.get_cache_stats().total_hits, 1);

    service.clear_cache();
    let stats = service.get_cache_stats();
    assert_eq!(stats.size, 0);
    assert_eq!(stats.total_hits, 0);
    assert_eq!(stats.total_size_bytes, 0);
    Ok(())
}

/// A two-entry cache never holds more than two datasets.
#[tokio::test]
async fn test_small_cache_bounds_size() -> anyhow::Result<()> {
    let config = HistoricalDataConfig {
        cache_size: 2,
        ..Default::default()
    };
    let service = seeded(config);
    let end = jan_1() + Duration::days(1);

    for pool in ["poolA", "poolB", "poolC"] {
        service
            .fetch_historical_data(pool, jan_1(), end, Interval::OneHour)
            .await?;
    }
    assert!(service.get_cache_stats().size <= 2);
    Ok(())
}

/// With fallback disabled, a failing remote surfaces as unavailable.
#[tokio::test]
async fn test_failing_remote_without_fallback() {
    let mut source = MockSource::new();
    source.expect_fetch().times(1).returning(|_: &str, _, _, _| {
        Err(dlmm_core::Error::Api {
            message: "History API error: 500".to_string(),
            status: Some(500),
        })
    });

    let config = HistoricalDataConfig {
        fallback_to_mock: false,
        ..Default::default()
    };
    let service = seeded(config).with_source(Arc::new(source));

    let err = service
        .fetch_historical_data(POOL_X, jan_1(), jan_1() + Duration::days(1), Interval::OneHour)
        .await
        .unwrap_err();
    assert!(err.is_unavailable());
    assert!(err.to_string().contains("unavailable"));
}

/// With fallback enabled, a failing remote still yields generated data.
#[tokio::test]
async fn test_failing_remote_with_fallback() -> anyhow::Result<()> {
    let mut source = MockSource::new();
    source.expect_fetch().returning(|_: &str, _, _, _| {
        Err(dlmm_core::Error::Api {
            message: "History API error: 502".to_string(),
            status: Some(502),
        })
    });

    let service = seeded(HistoricalDataConfig::default()).with_source(Arc::new(source));
    let data = service
        .fetch_historical_data(POOL_X, jan_1(), jan_1() + Duration::days(1), Interval::OneHour)
        .await?;
    assert_eq!(data.metadata.source, DataSource::Mock);
    assert_eq!(data.price_data.len(), 24);
    Ok(())
}

/// Remote partial data is stamped with its real coverage.
#[tokio::test]
async fn test_remote_partial_coverage() -> anyhow::Result<()> {
    let mut source = MockSource::new();
    source
        .expect_fetch()
        .times(1)
        .returning(|pool: &str, start, _end, interval| {
            // The remote only has the first half of the day.
            let generator = market_data::MarketDataGenerator::default();
            let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(9);
            Ok(generator.generate(&mut rng, pool, start, start + Duration::hours(12), interval))
        });

    let service = seeded(HistoricalDataConfig::default()).with_source(Arc::new(source));
    let data = service
        .fetch_historical_data(POOL_X, jan_1(), jan_1() + Duration::days(1), Interval::OneHour)
        .await?;

    assert_eq!(data.metadata.source, DataSource::Api);
    assert_eq!(data.metadata.data_points, 12);
    assert!((data.metadata.coverage - 0.5).abs() < f64::EPSILON);
    Ok(())
}

/// An inverted range does not fail and is treated as the forward range.
#[tokio::test]
async fn test_inverted_range() -> anyhow::Result<()> {
    let service = seeded(HistoricalDataConfig::default());
    let data = service
        .fetch_historical_data(POOL_X, jan_1() + Duration::days(1), jan_1(), Interval::OneHour)
        .await?;
    assert_eq!(data.price_data.len(), 24);
    assert!(data.start_time < data.end_time);
    Ok(())
}

/// Unknown interval labels fall back to hourly bars.
#[tokio::test]
async fn test_unknown_interval_label() -> anyhow::Result<()> {
    let service = seeded(HistoricalDataConfig::default());
    let data = service
        .fetch_historical_data_str(POOL_X, jan_1(), jan_1() + Duration::days(1), "fortnight")
        .await?;
    assert_eq!(data.interval, Interval::OneHour);
    assert_eq!(data.price_data.len(), 24);
    Ok(())
}

/// Dataset summary agrees with the raw series.
#[tokio::test]
async fn test_summary_matches_series() -> anyhow::Result<()> {
    let service = seeded(HistoricalDataConfig::default());
    let data = service
        .fetch_historical_data(POOL_X, jan_1(), jan_1() + Duration::days(2), Interval::FourHours)
        .await?;
    let summary = data.summary().expect("non-empty dataset");

    assert_eq!(summary.open, data.price_data[0].open);
    assert_eq!(summary.close, data.price_data[11].close);
    assert!(summary.high >= summary.low);
    assert!(summary.vwap >= summary.low && summary.vwap <= summary.high);
    let total: Decimal = data.price_data.iter().map(|p| p.volume).sum();
    assert_eq!(summary.total_volume, total);
    Ok(())
}
