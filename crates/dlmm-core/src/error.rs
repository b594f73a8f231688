//! Error types for the DLMM market data layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Unknown interval: {0}")]
    InvalidInterval(String),

    #[error("Data unavailable for pool {pool_address}: unable to fetch historical data and mock generation disabled")]
    DataUnavailable { pool_address: String },
}

impl Error {
    /// Whether this error means no data could be produced for the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::DataUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
