//! Return calculations over a series of composite portfolio totals.
//!
//! Every figure is `Option<Decimal>`: `None` means the metric is undefined
//! for the given history (too few snapshots, zero denominator) and must not
//! be shown as zero.
use anyhow::anyhow;
use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

const DAYS_PER_YEAR: Decimal = dec!(365.25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum HistoricalPeriod {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    ThreeYears,
    FiveYears,
}

impl Display for HistoricalPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                HistoricalPeriod::OneMonth => "1M",
                HistoricalPeriod::ThreeMonths => "3M",
                HistoricalPeriod::SixMonths => "6M",
                HistoricalPeriod::OneYear => "1Y",
                HistoricalPeriod::ThreeYears => "3Y",
                HistoricalPeriod::FiveYears => "5Y",
            }
        )
    }
}

impl HistoricalPeriod {
    pub const ALL: [HistoricalPeriod; 6] = [
        HistoricalPeriod::OneMonth,
        HistoricalPeriod::ThreeMonths,
        HistoricalPeriod::SixMonths,
        HistoricalPeriod::OneYear,
        HistoricalPeriod::ThreeYears,
        HistoricalPeriod::FiveYears,
    ];

    pub fn months(&self) -> u32 {
        match self {
            HistoricalPeriod::OneMonth => 1,
            HistoricalPeriod::ThreeMonths => 3,
            HistoricalPeriod::SixMonths => 6,
            HistoricalPeriod::OneYear => 12,
            HistoricalPeriod::ThreeYears => 36,
            HistoricalPeriod::FiveYears => 60,
        }
    }

    /// Calendar date one window before `date`, clamped to month end.
    pub fn start_from(&self, date: NaiveDate) -> Option<NaiveDate> {
        date.checked_sub_months(Months::new(self.months()))
    }
}

impl FromStr for HistoricalPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1M" => Ok(HistoricalPeriod::OneMonth),
            "3M" => Ok(HistoricalPeriod::ThreeMonths),
            "6M" => Ok(HistoricalPeriod::SixMonths),
            "1Y" => Ok(HistoricalPeriod::OneYear),
            "3Y" => Ok(HistoricalPeriod::ThreeYears),
            "5Y" => Ok(HistoricalPeriod::FiveYears),
            _ => Err(anyhow!("Invalid historical period: {}", s)),
        }
    }
}

/// A signed external flow, positioned by whole days from the period start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    pub days_since_start: i64,
    pub amount: Decimal,
}

/// Composite total of one snapshot together with the net external flow
/// recorded with it, both in the display currency.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub total_value: Decimal,
    pub net_cash_flow: Decimal,
}

/// Modified Dietz return of a single sub-period between two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReturn {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub begin_value: Decimal,
    pub end_value: Decimal,
    pub net_cash_flow: Decimal,
    pub return_rate: Option<Decimal>,
}

/// Modified Dietz return for one period.
///
/// Each flow is weighted by the share of the period it stayed invested, so a
/// flow on day 0 counts fully and one on the last day not at all. Returns
/// `None` for a non-positive period length or a zero denominator.
pub fn modified_dietz(
    begin_value: Decimal,
    end_value: Decimal,
    cash_flows: &[CashFlow],
    total_days: i64,
) -> Option<Decimal> {
    if total_days <= 0 {
        return None;
    }
    let total = Decimal::from(total_days);

    let mut net_cash_flow = Decimal::ZERO;
    let mut weighted_cash_flow = Decimal::ZERO;
    for flow in cash_flows {
        let days = flow.days_since_start.clamp(0, total_days);
        let weight = (total - Decimal::from(days)) / total;
        net_cash_flow += flow.amount;
        weighted_cash_flow += flow.amount * weight;
    }

    let denominator = begin_value + weighted_cash_flow;
    if denominator.is_zero() {
        return None;
    }
    Some((end_value - begin_value - net_cash_flow) / denominator)
}

fn sorted(points: &[PerformancePoint]) -> Vec<&PerformancePoint> {
    let mut sorted: Vec<&PerformancePoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.date);
    sorted
}

/// Modified Dietz return of every consecutive pair of points.
///
/// Flows recorded with the closing snapshot are placed at the middle of the
/// sub-period since their exact dates are unknown. Flows recorded with the
/// first snapshot precede any measured period.
pub fn period_returns(points: &[PerformancePoint]) -> Vec<PeriodReturn> {
    sorted(points)
        .windows(2)
        .map(|pair| {
            let (begin, end) = (pair[0], pair[1]);
            let total_days = (end.date - begin.date).num_days();
            let flows = if end.net_cash_flow.is_zero() {
                Vec::new()
            } else {
                vec![CashFlow {
                    days_since_start: total_days / 2,
                    amount: end.net_cash_flow,
                }]
            };
            let return_rate =
                modified_dietz(begin.total_value, end.total_value, &flows, total_days);
            debug!(start = %begin.date, end = %end.date, ?return_rate, "Sub-period return");
            PeriodReturn {
                start: begin.date,
                end: end.date,
                begin_value: begin.total_value,
                end_value: end.total_value,
                net_cash_flow: end.net_cash_flow,
                return_rate,
            }
        })
        .collect()
}

/// Chains sub-period returns: `Π(1 + R_k) - 1`.
pub fn cumulative_twr(points: &[PerformancePoint]) -> Option<Decimal> {
    chain(&period_returns(points))
}

fn chain(periods: &[PeriodReturn]) -> Option<Decimal> {
    if periods.is_empty() {
        return None;
    }
    periods
        .iter()
        .try_fold(Decimal::ONE, |acc, period| {
            period.return_rate.map(|r| acc * (Decimal::ONE + r))
        })
        .map(|growth| growth - Decimal::ONE)
}

/// Compound annual growth rate between the earliest and the latest point.
pub fn cagr(points: &[PerformancePoint]) -> Option<Decimal> {
    let sorted = sorted(points);
    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) if sorted.len() >= 2 => (*first, *last),
        _ => return None,
    };
    if first.total_value <= Decimal::ZERO {
        return None;
    }
    let days = (last.date - first.date).num_days();
    if days <= 0 {
        return None;
    }

    let years = Decimal::from(days) / DAYS_PER_YEAR;
    let ratio = last.total_value / first.total_value;
    if ratio.is_zero() {
        return Some(-Decimal::ONE);
    }
    if ratio < Decimal::ZERO {
        return None;
    }
    let exponent = Decimal::ONE / years;
    if let Some(growth) = ratio.checked_powd(exponent) {
        return Some(growth - Decimal::ONE);
    }

    // Short windows push the power out of range. A loss then tends to -100%.
    let log_growth = ratio.checked_ln()?.checked_mul(exponent);
    match log_growth.and_then(|l| l.checked_exp()) {
        Some(growth) => Some(growth - Decimal::ONE),
        None if ratio < Decimal::ONE => Some(-Decimal::ONE),
        None => {
            debug!(%ratio, %years, "CAGR out of decimal range");
            None
        }
    }
}

/// Change of the total value from the most recent point at least one
/// `period` before the latest point, up to the latest point.
pub fn growth_rate(points: &[PerformancePoint], period: HistoricalPeriod) -> Option<Decimal> {
    let sorted = sorted(points);
    let latest = *sorted.last()?;
    let window_start = period.start_from(latest.date)?;
    let earlier = sorted
        .iter()
        .rev()
        .find(|p| p.date <= window_start)
        .copied()?;
    if earlier.total_value.is_zero() {
        return None;
    }
    Some(latest.total_value / earlier.total_value - Decimal::ONE)
}

/// All time-based metrics for one history.
#[derive(Debug, Clone)]
pub struct PerformanceReport {
    pub periods: Vec<PeriodReturn>,
    pub cumulative_twr: Option<Decimal>,
    pub cagr: Option<Decimal>,
    pub growth: BTreeMap<HistoricalPeriod, Option<Decimal>>,
}

impl PerformanceReport {
    pub fn from_points(points: &[PerformancePoint]) -> Self {
        let periods = period_returns(points);
        let cumulative_twr = chain(&periods);
        let growth = HistoricalPeriod::ALL
            .iter()
            .map(|period| (*period, growth_rate(points, *period)))
            .collect();
        Self {
            periods,
            cumulative_twr,
            cagr: cagr(points),
            growth,
        }
    }
}
