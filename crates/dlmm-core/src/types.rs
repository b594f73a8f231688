//! Core domain types for DLMM historical market data.

pub mod dataset;
pub mod interval;
pub mod liquidity;
pub mod price;

pub use dataset::*;
pub use interval::*;
pub use liquidity::*;
pub use price::*;
