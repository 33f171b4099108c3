//! Reconstructs a platform-complete valuation for a snapshot.
//!
//! Platforms that were not updated in the target snapshot are filled in with
//! the values of the most recent earlier snapshot that has them. A platform
//! is always carried as a whole, from exactly one source snapshot.
use crate::core::error::EngineError;
use crate::core::model::{Asset, AssetValue, CompositeValue, Snapshot};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// Builds the composite valuation of `target` from the full history.
///
/// `snapshots` may be in any order. Returns at most one entry per asset:
/// direct values of `target` first, then carried values in the order their
/// platforms were resolved while walking back in time.
///
/// Fails with [`EngineError::SnapshotNotFound`] when `target` is not part of
/// `snapshots`.
pub fn composite_values(
    target: &Snapshot,
    snapshots: &[Snapshot],
    assets: &[Asset],
    values: &[AssetValue],
) -> Result<Vec<CompositeValue>, EngineError> {
    if !snapshots.iter().any(|s| s.id == target.id) {
        return Err(EngineError::SnapshotNotFound(target.id.clone()));
    }

    let platform_of: HashMap<&str, &str> = assets
        .iter()
        .map(|a| (a.id.as_str(), a.platform.as_str()))
        .collect();

    let mut values_by_snapshot: HashMap<&str, Vec<&AssetValue>> = HashMap::new();
    for value in values {
        values_by_snapshot
            .entry(value.snapshot_id.as_str())
            .or_default()
            .push(value);
    }

    let mut composite = Vec::new();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut present: HashSet<&str> = HashSet::new();

    for value in values_by_snapshot
        .get(target.id.as_str())
        .into_iter()
        .flatten()
        .copied()
    {
        let Some(platform) = platform_of.get(value.asset_id.as_str()).copied() else {
            warn!(asset = %value.asset_id, snapshot = %target.id, "Skipping value of unknown asset");
            continue;
        };
        if !emitted.insert(value.asset_id.as_str()) {
            warn!(asset = %value.asset_id, snapshot = %target.id, "Skipping duplicate asset value");
            continue;
        }
        present.insert(platform);
        composite.push(CompositeValue::direct(value));
    }

    let mut pending: BTreeSet<&str> = platform_of
        .values()
        .copied()
        .filter(|platform| !present.contains(platform))
        .collect();

    let mut earlier: Vec<&Snapshot> = snapshots
        .iter()
        .filter(|s| s.date < target.date)
        .collect();
    earlier.sort_by(|a, b| b.date.cmp(&a.date));

    for snapshot in earlier {
        if pending.is_empty() {
            break;
        }
        let Some(snapshot_values) = values_by_snapshot.get(snapshot.id.as_str()) else {
            continue;
        };

        let mut resolved: BTreeSet<&str> = BTreeSet::new();
        for value in snapshot_values.iter().copied() {
            let Some(platform) = platform_of.get(value.asset_id.as_str()).copied() else {
                continue;
            };
            if !pending.contains(platform) || !emitted.insert(value.asset_id.as_str()) {
                continue;
            }
            resolved.insert(platform);
            composite.push(CompositeValue::carried(value, snapshot.date));
        }

        for platform in resolved {
            debug!(platform, source = %snapshot.date, target = %target.date, "Carried platform forward");
            pending.remove(platform);
        }
    }

    if !pending.is_empty() {
        debug!(?pending, target = %target.date, "Platforms without any earlier value");
    }

    Ok(composite)
}

/// Sum of the composite market values of `target`, each still in its
/// asset's own currency.
pub fn composite_total_value(
    target: &Snapshot,
    snapshots: &[Snapshot],
    assets: &[Asset],
    values: &[AssetValue],
) -> Result<Decimal, EngineError> {
    Ok(composite_values(target, snapshots, assets, values)?
        .iter()
        .map(|v| v.market_value)
        .sum())
}
