//! Portfolio history records as handed to the engine by the loading layer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A holding tracked across snapshots.
///
/// `platform` is a plain grouping key. The empty string is a platform of its
/// own and is never read as "no platform".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub platform: String,
    pub category: Option<String>,
    pub currency: String,
}

/// A dated observation of the portfolio. Dates are unique per portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub date: NaiveDate,
}

/// Market value of one asset in one snapshot, in the asset's own currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetValue {
    pub snapshot_id: String,
    pub asset_id: String,
    pub market_value: Decimal,
}

/// Money moved in (positive) or out (negative) of the portfolio, recorded
/// alongside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowOperation {
    pub snapshot_id: String,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Target share of the portfolio in percent. `None` means no target.
    pub target_allocation: Option<Decimal>,
}

/// Resolved valuation of one asset for a target snapshot.
///
/// Never persisted; recomputed from history on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeValue {
    pub asset_id: String,
    pub market_value: Decimal,
    pub is_carried_forward: bool,
    /// Date of the snapshot the value was taken from when carried forward.
    pub source_date: Option<NaiveDate>,
}

impl CompositeValue {
    pub fn direct(value: &AssetValue) -> Self {
        Self {
            asset_id: value.asset_id.clone(),
            market_value: value.market_value,
            is_carried_forward: false,
            source_date: None,
        }
    }

    pub fn carried(value: &AssetValue, source_date: NaiveDate) -> Self {
        Self {
            asset_id: value.asset_id.clone(),
            market_value: value.market_value,
            is_carried_forward: true,
            source_date: Some(source_date),
        }
    }
}
