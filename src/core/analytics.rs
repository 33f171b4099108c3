//! Ties the engine pieces together for a loaded portfolio history.
use crate::core::allocation::category_allocation;
use crate::core::carry_forward;
use crate::core::currency::{RateProvider, RateTable};
use crate::core::error::EngineError;
use crate::core::model::{Asset, AssetValue, CashFlowOperation, Category, CompositeValue, Snapshot};
use crate::core::performance::PerformancePoint;
use crate::core::rebalance::RebalanceInput;
use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Read-only collections describing a portfolio's recorded history.
#[derive(Debug, Clone, Default)]
pub struct PortfolioHistory {
    pub assets: Vec<Asset>,
    pub snapshots: Vec<Snapshot>,
    pub asset_values: Vec<AssetValue>,
    pub cash_flows: Vec<CashFlowOperation>,
    pub categories: Vec<Category>,
}

impl PortfolioHistory {
    /// Snapshots sorted by date, oldest first.
    pub fn snapshots_by_date(&self) -> Vec<&Snapshot> {
        let mut snapshots: Vec<&Snapshot> = self.snapshots.iter().collect();
        snapshots.sort_by_key(|s| s.date);
        snapshots
    }

    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.iter().max_by_key(|s| s.date)
    }

    pub fn snapshot_on(&self, date: NaiveDate) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.date == date)
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn cash_flows_for<'a>(
        &'a self,
        snapshot: &'a Snapshot,
    ) -> impl Iterator<Item = &'a CashFlowOperation> + 'a {
        self.cash_flows
            .iter()
            .filter(move |flow| flow.snapshot_id == snapshot.id)
    }

    pub fn net_cash_flow(&self, snapshot: &Snapshot) -> Decimal {
        self.cash_flows_for(snapshot).map(|flow| flow.amount).sum()
    }

    pub fn composite_values(&self, target: &Snapshot) -> Result<Vec<CompositeValue>, EngineError> {
        carry_forward::composite_values(target, &self.snapshots, &self.assets, &self.asset_values)
    }

    /// Whether valuing in `currency` needs exchange rates at all.
    pub fn needs_conversion(&self, currency: &str) -> bool {
        self.assets.iter().any(|a| a.currency != currency)
    }
}

/// One resolved holding, converted into the display currency.
#[derive(Debug, Clone)]
pub struct HoldingValue {
    pub asset: Asset,
    pub composite: CompositeValue,
    pub converted_value: Decimal,
}

#[derive(Debug, Clone)]
pub struct SnapshotValuation {
    pub snapshot: Snapshot,
    pub currency: String,
    pub holdings: Vec<HoldingValue>,
    pub total_value: Decimal,
}

impl SnapshotValuation {
    pub fn carried_count(&self) -> usize {
        self.holdings
            .iter()
            .filter(|h| h.composite.is_carried_forward)
            .count()
    }
}

/// Values `snapshot` in `display_currency`, converting every composite value
/// with its own asset currency before summing.
pub fn value_snapshot(
    history: &PortfolioHistory,
    snapshot: &Snapshot,
    rates: &RateTable,
    display_currency: &str,
) -> Result<SnapshotValuation, EngineError> {
    let mut holdings = Vec::new();
    let mut total_value = Decimal::ZERO;

    for composite in history.composite_values(snapshot)? {
        let Some(asset) = history.asset(&composite.asset_id) else {
            continue;
        };
        let converted_value =
            rates.convert(composite.market_value, &asset.currency, display_currency)?;
        total_value += converted_value;
        holdings.push(HoldingValue {
            asset: asset.clone(),
            composite,
            converted_value,
        });
    }

    Ok(SnapshotValuation {
        snapshot: snapshot.clone(),
        currency: display_currency.to_string(),
        holdings,
        total_value,
    })
}

/// Rate table for valuing `snapshot`, fetched only when some asset is held
/// in another currency than `display_currency`.
pub async fn rates_for(
    history: &PortfolioHistory,
    snapshot: &Snapshot,
    provider: &(dyn RateProvider + Send + Sync),
    display_currency: &str,
) -> Result<RateTable, EngineError> {
    if !history.needs_conversion(display_currency) {
        debug!(date = %snapshot.date, "All assets held in display currency, skipping rates");
        return Ok(RateTable::empty(display_currency, snapshot.date));
    }
    Ok(provider.fetch_rates(snapshot.date, display_currency).await?)
}

/// Values every snapshot of `history` and returns the series the
/// performance calculations consume, oldest first.
#[instrument(skip_all, fields(currency = %display_currency))]
pub async fn value_history(
    history: &PortfolioHistory,
    provider: &(dyn RateProvider + Send + Sync),
    display_currency: &str,
    update_callback: &dyn Fn(),
) -> Result<Vec<PerformancePoint>, EngineError> {
    let snapshots = history.snapshots_by_date();

    let rate_futures = snapshots.iter().map(|snapshot| async move {
        let rates = rates_for(history, snapshot, provider, display_currency).await;
        update_callback();
        rates
    });
    let rate_tables = join_all(rate_futures).await;

    snapshots
        .into_iter()
        .zip(rate_tables)
        .map(|(snapshot, rates)| -> Result<PerformancePoint, EngineError> {
            let valuation = value_snapshot(history, snapshot, &rates?, display_currency)?;
            Ok(PerformancePoint {
                date: snapshot.date,
                total_value: valuation.total_value,
                net_cash_flow: history.net_cash_flow(snapshot),
            })
        })
        .collect()
}

/// Value and share of one category in a snapshot valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAllocation {
    pub name: String,
    pub value: Decimal,
    pub allocation: Option<Decimal>,
    pub target: Option<Decimal>,
}

/// Groups a valuation by category.
///
/// Declared categories come first in declaration order, including those with
/// nothing in them, then categories only named by assets, then assets with
/// no category at all.
pub fn category_breakdown(
    valuation: &SnapshotValuation,
    history: &PortfolioHistory,
) -> Vec<CategoryAllocation> {
    let mut values: BTreeMap<&str, Decimal> = BTreeMap::new();
    for holding in &valuation.holdings {
        let name = holding.asset.category.as_deref().unwrap_or(UNCATEGORIZED);
        *values.entry(name).or_default() += holding.converted_value;
    }

    let allocation_of = |name: &str, value: Decimal, target: Option<Decimal>| CategoryAllocation {
        name: name.to_string(),
        value,
        allocation: category_allocation(value, valuation.total_value),
        target,
    };

    let mut breakdown: Vec<CategoryAllocation> = history
        .categories
        .iter()
        .map(|category| {
            let value = values.remove(category.name.as_str()).unwrap_or_default();
            allocation_of(&category.name, value, category.target_allocation)
        })
        .collect();

    let uncategorized = values.remove(UNCATEGORIZED);
    breakdown.extend(
        values
            .into_iter()
            .map(|(name, value)| allocation_of(name, value, None)),
    );
    if let Some(value) = uncategorized {
        breakdown.push(allocation_of(UNCATEGORIZED, value, None));
    }
    breakdown
}

pub fn rebalancing_inputs(breakdown: &[CategoryAllocation]) -> Vec<RebalanceInput> {
    breakdown
        .iter()
        .map(|category| RebalanceInput {
            category: category.name.clone(),
            current_value: category.value,
            target_percentage: category.target,
        })
        .collect()
}
