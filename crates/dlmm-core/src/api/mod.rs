//! API clients for external services.

pub mod history;

pub use history::{stamp_remote, HistoryApiClient};
