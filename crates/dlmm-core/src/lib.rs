//! DLMM Core Library
//!
//! Shared types, configuration, and the remote history API client for the
//! DLMM dashboard's market data layer.

pub mod api;
pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
