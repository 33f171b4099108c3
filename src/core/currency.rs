//! Currency conversion over cached rate tables, and the rate provider seam.

use crate::core::error::{EngineError, RateError};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Exchange rates for one date, expressed as units of each currency per one
/// unit of `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub date: NaiveDate,
    pub rates: HashMap<String, Decimal>,
}

impl RateTable {
    /// An empty table, enough for portfolios held entirely in `base`.
    pub fn empty(base: &str, date: NaiveDate) -> Self {
        Self {
            base: base.to_string(),
            date,
            rates: HashMap::new(),
        }
    }

    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal, EngineError> {
        convert(amount, from, &self.rates, &self.base, to)
    }
}

/// Converts `amount` from `from` into `to` through the table's base currency.
///
/// Divides by the rate of `from` unless it is the base, then multiplies by
/// the rate of `to` unless that is the base. A rate the conversion needs but
/// the table lacks is an error, never a silent no-op.
pub fn convert(
    amount: Decimal,
    from: &str,
    rates: &HashMap<String, Decimal>,
    base: &str,
    to: &str,
) -> Result<Decimal, EngineError> {
    if from == to {
        return Ok(amount);
    }

    let in_base = if from == base {
        amount
    } else {
        amount
            .checked_div(rate_for(from, rates, base)?)
            .ok_or_else(|| EngineError::InvalidRate {
                currency: from.to_string(),
            })?
    };

    if to == base {
        Ok(in_base)
    } else {
        Ok(in_base * rate_for(to, rates, base)?)
    }
}

fn rate_for(
    currency: &str,
    rates: &HashMap<String, Decimal>,
    base: &str,
) -> Result<Decimal, EngineError> {
    let rate = rates
        .get(currency)
        .copied()
        .ok_or_else(|| EngineError::MissingRate {
            currency: currency.to_string(),
            base: base.to_string(),
        })?;
    if rate <= Decimal::ZERO {
        return Err(EngineError::InvalidRate {
            currency: currency.to_string(),
        });
    }
    Ok(rate)
}

/// Source of exchange rates. Implementations own fetching, caching and any
/// retry policy.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self, date: NaiveDate, base: &str) -> Result<RateTable, RateError>;

    /// Supported currencies, keyed by code with a display name.
    async fn fetch_currency_list(&self) -> Result<BTreeMap<String, String>, RateError>;
}
