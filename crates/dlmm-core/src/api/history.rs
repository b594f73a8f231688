//! Client for the remote pool history endpoint.
//!
//! The endpoint returns the same dataset shape the local generator produces.
//! This client performs exactly one request per call; retry policy belongs to
//! the caller.

use crate::types::{DataSource, HistoricalDataset, Interval};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::time::Duration as StdDuration;
use tracing::{debug, info};

/// HTTP client for `GET {base}/pools/{pool}/history`.
pub struct HistoryApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl HistoryApiClient {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

    pub fn new(base_url: impl Into<String>, timeout: Option<StdDuration>) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout.unwrap_or(Self::DEFAULT_TIMEOUT))
            .connect_timeout(StdDuration::from_secs(5))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request URL for a history query.
    pub fn history_url(
        &self,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> String {
        format!(
            "{}/pools/{}/history?start={}&end={}&interval={}",
            self.base_url,
            pool_address,
            start.timestamp_millis(),
            end.timestamp_millis(),
            interval
        )
    }

    /// Fetch a dataset for a pool and range.
    ///
    /// The returned dataset is stamped as API-sourced and its coverage is
    /// recomputed against the requested range.
    pub async fn fetch_history(
        &self,
        pool_address: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<HistoricalDataset> {
        let url = self.history_url(pool_address, start, end, interval);
        debug!(url = %url, "Requesting pool history");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                message: format!("History API error: {}", status),
                status: Some(status.as_u16()),
            });
        }

        let body = response.text().await?;
        let dataset: HistoricalDataset = serde_json::from_str(&body)?;
        let dataset = stamp_remote(dataset, pool_address, start, end, interval);

        info!(
            pool = pool_address,
            points = dataset.price_data.len(),
            coverage = dataset.metadata.coverage,
            "Fetched pool history from API"
        );
        Ok(dataset)
    }
}

/// Normalize a remote payload against the pool and range that were requested.
pub fn stamp_remote(
    mut dataset: HistoricalDataset,
    pool_address: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: Interval,
) -> HistoricalDataset {
    let expected = interval.expected_points((end - start).num_milliseconds());
    let points = dataset.price_data.len();

    if dataset.pool_address != pool_address {
        debug!(
            requested = pool_address,
            returned = %dataset.pool_address,
            "Remote history echoed a different pool"
        );
        dataset.pool_address = pool_address.to_string();
    }
    dataset.metadata.source = DataSource::Api;
    dataset.metadata.data_points = points;
    dataset.metadata.coverage = if expected == 0 {
        1.0
    } else {
        (points as f64 / expected as f64).min(1.0)
    };
    dataset
}
