//! Synthetic price and liquidity generator.
//!
//! Produces a random-walk OHLCV series and a ladder of DLMM bin snapshots
//! around each bar's close. All randomness comes from the caller's RNG, so a
//! seeded RNG reproduces a dataset exactly.

use chrono::{DateTime, Utc};
use dlmm_core::types::{
    DataSource, DatasetMetadata, HistoricalDataset, Interval, LiquidityBinSnapshot, PricePoint,
    MAX_ACTIVE_BINS, MAX_FEE_RATE,
};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Decimal places kept on prices.
const PRICE_DP: u32 = 8;
/// Decimal places kept on volumes.
const VOLUME_DP: u32 = 2;
/// Decimal places kept on bin reserves.
const LIQUIDITY_DP: u32 = 6;

/// Floor applied to every generated close.
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Upper bound on a single bar's absolute return.
pub const MAX_STEP_MOVE: f64 = 0.03;
/// Upper bound on a wick beyond the body, per side.
pub const MAX_WICK_PCT: f64 = 0.025;
/// Largest starting price the walk accepts.
const MAX_INITIAL_PRICE: f64 = 1e12;
/// Largest per-hour volume or per-bin reserve accepted.
const MAX_QUANTITY: f64 = 1e15;
/// Largest number of bins emitted per timestamp.
const MAX_BIN_COUNT: usize = 1_000;

/// Tuning knobs for the synthetic market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Price around which the walk starts (jittered by ±5%).
    pub initial_price: f64,
    /// Standard deviation of a one-hour return.
    pub hourly_volatility: f64,
    /// Clamp on a single bar's absolute return.
    pub max_step_move: f64,
    /// Maximum wick beyond the body, per side, as a fraction.
    pub max_wick_pct: f64,
    /// Volume traded in a quiet hour.
    pub base_hourly_volume: f64,
    /// Extra volume per unit of relative price move.
    pub volatility_volume_factor: f64,
    /// Bins emitted per timestamp.
    pub bin_count: usize,
    /// Bin step in basis points.
    pub bin_step_bps: u16,
    /// Bins within this distance of the current price are active.
    pub active_bin_radius: usize,
    /// Fee charged by the bin holding the current price.
    pub base_fee_rate: f64,
    /// Reference reserves for one bin.
    pub liquidity_per_bin: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            initial_price: 100.0,
            hourly_volatility: 0.004,
            max_step_move: 0.03,
            max_wick_pct: 0.02,
            base_hourly_volume: 50_000.0,
            volatility_volume_factor: 25.0,
            bin_count: 20,
            bin_step_bps: 25,
            active_bin_radius: 2,
            base_fee_rate: 0.0025,
            liquidity_per_bin: 10_000.0,
        }
    }
}

impl GeneratorConfig {
    /// Copy with every knob forced into its usable range.
    ///
    /// Non-finite values fall back to the default. Step and wick are capped
    /// so that `(high - low) / close` stays below 0.1 for every bar.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f64, default: f64| if value.is_finite() { value } else { default };

        let initial_price = finite_or(self.initial_price, defaults.initial_price);
        let initial_price = if initial_price > 0.0 {
            initial_price.min(MAX_INITIAL_PRICE)
        } else {
            defaults.initial_price
        };

        Self {
            initial_price,
            hourly_volatility: finite_or(self.hourly_volatility, defaults.hourly_volatility)
                .clamp(0.0, 1.0),
            max_step_move: finite_or(self.max_step_move, defaults.max_step_move)
                .abs()
                .min(MAX_STEP_MOVE),
            max_wick_pct: finite_or(self.max_wick_pct, defaults.max_wick_pct)
                .clamp(0.0, MAX_WICK_PCT),
            base_hourly_volume: finite_or(self.base_hourly_volume, defaults.base_hourly_volume)
                .clamp(1.0, MAX_QUANTITY),
            volatility_volume_factor: finite_or(
                self.volatility_volume_factor,
                defaults.volatility_volume_factor,
            )
            .clamp(0.0, 1_000.0),
            bin_count: self.bin_count.clamp(1, MAX_BIN_COUNT),
            bin_step_bps: self.bin_step_bps.max(1),
            active_bin_radius: self.active_bin_radius.min((MAX_ACTIVE_BINS - 1) / 2),
            base_fee_rate: finite_or(self.base_fee_rate, defaults.base_fee_rate)
                .clamp(0.0001, MAX_FEE_RATE / 4.0),
            liquidity_per_bin: finite_or(self.liquidity_per_bin, defaults.liquidity_per_bin)
                .clamp(1.0, MAX_QUANTITY),
        }
    }
}

/// Generator for synthetic pool history.
#[derive(Debug, Clone, Default)]
pub struct MarketDataGenerator {
    config: GeneratorConfig,
}

impl MarketDataGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a full dataset for `[start, end)` at `interval`.
    ///
    /// An inverted range yields an empty dataset; callers that want
    /// swap semantics normalize the range first.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> HistoricalDataset {
        let count = interval.expected_points((end - start).num_milliseconds());
        let price_data = self.generate_price_series(rng, start, interval, count);
        let liquidity_data = self.generate_liquidity(rng, &price_data, interval);

        debug!(
            pool = pool_address,
            interval = %interval,
            points = price_data.len(),
            bins = liquidity_data.len(),
            "Generated synthetic history"
        );

        HistoricalDataset {
            pool_address: pool_address.to_string(),
            start_time: start,
            end_time: end,
            interval,
            metadata: DatasetMetadata {
                source: DataSource::Mock,
                coverage: 1.0,
                data_points: price_data.len(),
                generated_at: Utc::now(),
            },
            price_data,
            liquidity_data,
        }
    }

    /// Random-walk OHLCV series of `count` bars starting at `start`.
    pub fn generate_price_series<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        start: DateTime<Utc>,
        interval: Interval,
        count: usize,
    ) -> Vec<PricePoint> {
        let cfg = &self.config;
        let step = interval.duration();
        let sigma = cfg.hourly_volatility * interval.hours().sqrt();
        let returns = Normal::new(0.0, sigma).ok();
        let max_move = cfg.max_step_move;
        let max_wick = cfg.max_wick_pct;
        let base_volume = cfg.base_hourly_volume * interval.hours();

        let seed = cfg.initial_price * rng.gen_range(0.95..1.05);
        let mut open = to_decimal(seed).round_dp(PRICE_DP).max(MIN_PRICE);
        let mut points = Vec::with_capacity(count);

        for i in 0..count {
            let ret = match &returns {
                Some(normal) => normal.sample(rng),
                None => 0.0,
            }
            .clamp(-max_move, max_move);
            // On overflow the bar closes flat.
            let close = open
                .checked_mul(to_decimal(1.0 + ret))
                .unwrap_or(open)
                .round_dp(PRICE_DP)
                .max(MIN_PRICE);

            let upper_wick = to_decimal(1.0 + rng.gen_range(0.0..=max_wick));
            let lower_wick = to_decimal(1.0 - rng.gen_range(0.0..=max_wick));
            let body_high = open.max(close);
            let high = body_high
                .checked_mul(upper_wick)
                .unwrap_or(body_high)
                .round_dp_with_strategy(PRICE_DP, RoundingStrategy::AwayFromZero);
            let low = (open.min(close) * lower_wick)
                .round_dp_with_strategy(PRICE_DP, RoundingStrategy::ToZero);

            let moved = ((close - open).abs() / open).to_f64().unwrap_or(0.0);
            let noise = rng.gen_range(0.8..1.2);
            let volume =
                to_decimal(base_volume * (1.0 + cfg.volatility_volume_factor * moved) * noise)
                    .round_dp(VOLUME_DP);
            let volume_x = (volume * to_decimal(rng.gen_range(0.3..0.7))).round_dp(VOLUME_DP);
            let volume_y = volume - volume_x;

            points.push(PricePoint {
                timestamp: start + step * i as i32,
                open,
                high,
                low,
                close,
                volume,
                volume_x,
                volume_y,
            });

            open = close;
        }

        points
    }

    /// Bin ladder around each bar's close.
    pub fn generate_liquidity<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        prices: &[PricePoint],
        interval: Interval,
    ) -> Vec<LiquidityBinSnapshot> {
        let cfg = &self.config;
        let bin_count = cfg.bin_count;
        let half = (bin_count / 2) as i32;
        let radius = cfg.active_bin_radius as i32;
        let active_bins = (0..bin_count as i32)
            .filter(|o| (o - half).abs() <= radius)
            .count()
            .max(1) as f64;
        let base_fee = cfg.base_fee_rate;
        let scale = cfg.liquidity_per_bin;
        let bars_per_day = 24.0 / interval.hours();

        let mut snapshots = Vec::with_capacity(prices.len() * bin_count);

        for point in prices {
            let close = point.close.to_f64().unwrap_or(cfg.initial_price);
            let active_id = self.price_to_bin_id(close);
            let volume_24h = point.volume.to_f64().unwrap_or(0.0) * bars_per_day;

            for offset in 0..bin_count as i32 {
                let bin_id = active_id - half + offset;
                let distance = (bin_id - active_id).abs();
                let is_active = distance <= radius;
                let decay = 1.0 + 0.1 * distance as f64;

                let (total, x_share, utilization, bin_volume) = if is_active {
                    (
                        scale * rng.gen_range(3.0..5.0),
                        rng.gen_range(0.4..0.6),
                        rng.gen_range(0.5..0.95),
                        volume_24h * rng.gen_range(0.8..1.0) / active_bins,
                    )
                } else {
                    // Bins above the price hold mostly X, bins below mostly Y.
                    let x_share = if bin_id > active_id {
                        rng.gen_range(0.8..0.95)
                    } else {
                        rng.gen_range(0.05..0.2)
                    };
                    (
                        scale * rng.gen_range(0.3..1.0) / decay,
                        x_share,
                        rng.gen_range(0.0..0.3) / decay,
                        volume_24h * rng.gen_range(0.0..0.01) / decay,
                    )
                };

                let total = to_decimal(total);
                let liquidity_x = (total * to_decimal(x_share)).round_dp(LIQUIDITY_DP);
                let liquidity_y = (total - liquidity_x).round_dp(LIQUIDITY_DP);
                let variable_fee = base_fee * 0.1 * distance as f64 * rng.gen_range(0.0..1.0);
                let fee_rate = (base_fee + variable_fee).min(MAX_FEE_RATE * 0.99);

                snapshots.push(LiquidityBinSnapshot {
                    timestamp: point.timestamp,
                    bin_id,
                    liquidity_x,
                    liquidity_y,
                    fee_rate,
                    is_active,
                    utilization_rate: utilization.clamp(0.0, 1.0),
                    volume_24h: to_decimal(bin_volume).round_dp(VOLUME_DP),
                });
            }
        }

        snapshots
    }

    /// Bin holding `price` on the ladder `price = (1 + step)^bin_id`.
    pub fn price_to_bin_id(&self, price: f64) -> i32 {
        let step = 1.0 + self.config.bin_step_bps as f64 / 10_000.0;
        if price <= 0.0 || !price.is_finite() || step <= 1.0 {
            return 0;
        }
        (price.ln() / step.ln()).round() as i32
    }

    /// Lower price bound of a bin.
    pub fn bin_price(&self, bin_id: i32) -> f64 {
        let step = 1.0 + self.config.bin_step_bps as f64 / 10_000.0;
        step.powi(bin_id)
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}
