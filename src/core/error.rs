//! Classified failures raised by the valuation engine and rate providers.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures of a rate provider, classified so callers can react to each
/// kind separately. Cloneable so a single pending fetch can be shared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("Rate provider unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("No rates found for {base} on {date}")]
    NotFound { date: NaiveDate, base: String },

    #[error("Invalid rate provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Snapshot {0} is not part of the provided history")]
    SnapshotNotFound(String),

    #[error("Missing exchange rate for {currency} in table based on {base}")]
    MissingRate { currency: String, base: String },

    #[error("Exchange rate for {currency} must be positive")]
    InvalidRate { currency: String },

    #[error(transparent)]
    Rates(#[from] RateError),
}
