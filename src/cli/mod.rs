//! Terminal commands built on the valuation engine

pub mod alloc;
pub mod currencies;
pub mod rebalance;
pub mod returns;
pub mod setup;
pub mod summary;
pub mod ui;

use crate::core::analytics::{self, PortfolioHistory, SnapshotValuation};
use crate::core::currency::RateProvider;
use crate::core::model::Snapshot;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

/// Picks the snapshot on `date`, or the latest one when no date is given.
pub fn select_snapshot(history: &PortfolioHistory, date: Option<NaiveDate>) -> Result<&Snapshot> {
    match date {
        Some(date) => history
            .snapshot_on(date)
            .ok_or_else(|| anyhow!("No snapshot recorded on {date}")),
        None => history
            .latest_snapshot()
            .ok_or_else(|| anyhow!("No snapshots recorded yet")),
    }
}

/// Values one snapshot in `currency`, fetching its rate table if needed.
pub async fn valuate(
    history: &PortfolioHistory,
    date: Option<NaiveDate>,
    rate_provider: &(dyn RateProvider + Send + Sync),
    currency: &str,
) -> Result<SnapshotValuation> {
    let snapshot = select_snapshot(history, date)?;

    let pb = ui::new_progress_bar(1, true);
    pb.set_message("Fetching exchange rates...");
    let rates = analytics::rates_for(history, snapshot, rate_provider, currency).await;
    pb.finish_and_clear();

    let rates = rates.with_context(|| format!("Failed to get exchange rates for {}", snapshot.date))?;
    analytics::value_snapshot(history, snapshot, &rates, currency)
        .with_context(|| format!("Failed to value snapshot of {}", snapshot.date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> PortfolioHistory {
        PortfolioHistory {
            snapshots: vec![
                Snapshot {
                    id: "a".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                },
                Snapshot {
                    id: "b".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_select_snapshot() {
        let history = history();
        assert_eq!(select_snapshot(&history, None).unwrap().id, "b");
        assert_eq!(
            select_snapshot(&history, NaiveDate::from_ymd_opt(2024, 1, 31))
                .unwrap()
                .id,
            "a"
        );
        let err = select_snapshot(&history, NaiveDate::from_ymd_opt(2024, 3, 1)).unwrap_err();
        assert_eq!(err.to_string(), "No snapshot recorded on 2024-03-01");
        assert!(select_snapshot(&PortfolioHistory::default(), None).is_err());
    }
}
