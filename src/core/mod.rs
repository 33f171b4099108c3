//! Valuation and performance engine

pub mod allocation;
pub mod analytics;
pub mod carry_forward;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod model;
pub mod performance;
pub mod rebalance;

// Re-export main types for cleaner imports
pub use currency::{RateProvider, RateTable};
pub use error::{EngineError, RateError};
pub use performance::{HistoricalPeriod, PerformancePoint, PerformanceReport};
