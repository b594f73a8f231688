//! Historical market data service.
//!
//! Serves pool history from the cache when possible, otherwise from the
//! configured remote source, falling back to synthetic generation when the
//! remote path is absent or fails and fallback is enabled.

use chrono::{DateTime, Utc};
use dlmm_core::api::{stamp_remote, HistoryApiClient};
use dlmm_core::config::HistoricalDataConfig;
use dlmm_core::types::{HistoricalDataset, Interval};
use dlmm_core::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheKey, CacheStats, DatasetCache};
use crate::generator::{GeneratorConfig, MarketDataGenerator};
use crate::source::HistoricalDataSource;

/// Cached, fallback-aware provider of pool history.
pub struct HistoricalDataService {
    config: HistoricalDataConfig,
    generator: MarketDataGenerator,
    cache: Mutex<DatasetCache>,
    rng: Mutex<StdRng>,
    source: Option<Arc<dyn HistoricalDataSource>>,
}

impl HistoricalDataService {
    /// Create a service from configuration.
    ///
    /// When `api_endpoint` is set, an HTTP source is attached.
    pub fn new(config: HistoricalDataConfig) -> Result<Self> {
        config.validate()?;

        let source = match &config.api_endpoint {
            Some(endpoint) => {
                let client = HistoryApiClient::new(endpoint.clone(), Some(config.request_timeout()))?;
                Some(Arc::new(client) as Arc<dyn HistoricalDataSource>)
            }
            None => None,
        };

        let cache = DatasetCache::new(config.cache_size, config.cache_ttl(), config.cache_max_bytes);

        Ok(Self {
            generator: MarketDataGenerator::default(),
            cache: Mutex::new(cache),
            rng: Mutex::new(StdRng::from_entropy()),
            source,
            config,
        })
    }

    /// Replace the remote source.
    pub fn with_source(mut self, source: Arc<dyn HistoricalDataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Detach any remote source.
    pub fn without_source(mut self) -> Self {
        self.source = None;
        self
    }

    /// Seed the generator's RNG for reproducible output.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_generator_config(mut self, config: GeneratorConfig) -> Self {
        self.generator = MarketDataGenerator::new(config);
        self
    }

    pub fn config(&self) -> &HistoricalDataConfig {
        &self.config
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Fetch history for a pool over a time range.
    ///
    /// An inverted range is swapped. Returns [`Error::DataUnavailable`] only
    /// when no remote data could be obtained and fallback is disabled.
    pub async fn fetch_historical_data(
        &self,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<Arc<HistoricalDataset>> {
        let (start, end) = normalize_range(pool_address, start, end);
        let key = CacheKey::new(pool_address, start, end, interval);

        let cached = lock(&self.cache).get(&key, Utc::now());
        if let Some(dataset) = cached {
            return Ok(dataset);
        }
        debug!(key = %key, "Cache miss");

        let dataset = match self.fetch_remote(pool_address, start, end, interval).await {
            Some(dataset) => dataset,
            None if self.config.fallback_to_mock => {
                self.generate(pool_address, start, end, interval)
            }
            None => {
                return Err(Error::DataUnavailable {
                    pool_address: pool_address.to_string(),
                })
            }
        };

        let dataset = Arc::new(dataset);
        // Serializing for the size estimate happens outside the cache lock.
        let size_bytes = dataset.estimated_size_bytes();
        let entry = CacheEntry::new(pool_address, Arc::clone(&dataset), size_bytes, Utc::now());
        let evicted = lock(&self.cache).insert(key, entry, Utc::now());
        if evicted > 0 {
            debug!(evicted, "Cache entries evicted");
        }

        Ok(dataset)
    }

    /// Like [`fetch_historical_data`](Self::fetch_historical_data), taking the
    /// interval as a label. Unknown labels default to `1h`.
    pub async fn fetch_historical_data_str(
        &self,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: &str,
    ) -> Result<Arc<HistoricalDataset>> {
        let interval = Interval::parse_or_default(interval);
        self.fetch_historical_data(pool_address, start, end, interval)
            .await
    }

    /// Cache usage, after dropping expired entries.
    pub fn get_cache_stats(&self) -> CacheStats {
        let mut cache = lock(&self.cache);
        cache.purge_expired(Utc::now());
        cache.stats()
    }

    /// Drop every cached dataset and hit counter.
    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
        info!("Historical data cache cleared");
    }

    /// Drop every cached dataset for one pool.
    pub fn invalidate_pool(&self, pool_address: &str) -> usize {
        lock(&self.cache).invalidate_pool(pool_address)
    }

    async fn fetch_remote(
        &self,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Option<HistoricalDataset> {
        let source = self.source.as_ref()?;

        match source.fetch(pool_address, start, end, interval).await {
            Ok(dataset) => {
                let dataset = stamp_remote(dataset, pool_address, start, end, interval);
                info!(
                    pool = pool_address,
                    points = dataset.price_data.len(),
                    "Loaded history from remote source"
                );
                Some(dataset)
            }
            Err(e) => {
                warn!(
                    pool = pool_address,
                    error = %e,
                    fallback = self.config.fallback_to_mock,
                    "Remote history fetch failed"
                );
                None
            }
        }
    }

    fn generate(
        &self,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> HistoricalDataset {
        let mut rng = lock(&self.rng);
        let dataset = self
            .generator
            .generate(&mut *rng, pool_address, start, end, interval);

        info!(
            pool = pool_address,
            interval = %interval,
            points = dataset.price_data.len(),
            "Generated mock history"
        );
        dataset
    }
}

fn normalize_range(
    pool_address: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    if end < start {
        warn!(
            pool = pool_address,
            start = %start,
            end = %end,
            "Inverted time range, swapping"
        );
        (end, start)
    } else {
        (start, end)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
