use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

const HUNDRED: Decimal = dec!(100);

/// Share of `total_value` held by a category, in percent.
///
/// Undefined when the portfolio is worth nothing. Percentages are never
/// rescaled, so a full breakdown may sum to slightly more or less than 100.
pub fn category_allocation(category_value: Decimal, total_value: Decimal) -> Option<Decimal> {
    if total_value.is_zero() {
        return None;
    }
    Some(category_value / total_value * HUNDRED)
}

/// Progress of the portfolio towards an optional savings goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalMetrics {
    /// Percent of the goal reached. Can exceed 100.
    pub achievement_rate: Decimal,
    /// Amount still missing. Negative once the goal is exceeded.
    pub distance_to_goal: Decimal,
    pub is_goal_reached: bool,
}

impl GoalMetrics {
    pub fn new(total_value: Decimal, goal: Option<Decimal>) -> Self {
        let Some(goal) = goal else {
            return Self {
                achievement_rate: Decimal::ZERO,
                distance_to_goal: Decimal::ZERO,
                is_goal_reached: false,
            };
        };

        let achievement_rate = if goal <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            total_value / goal * HUNDRED
        };

        Self {
            achievement_rate,
            distance_to_goal: goal - total_value,
            is_goal_reached: total_value >= goal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_not_normalised() {
        let total = dec!(99999);
        let allocations: Vec<Decimal> = (0..3)
            .map(|_| category_allocation(dec!(33333), total).unwrap())
            .collect();

        for allocation in &allocations {
            assert!(*allocation >= dec!(33.33) && *allocation <= dec!(33.34));
        }
        let rounded_sum: Decimal = allocations.iter().map(|a| a.round_dp(2)).sum();
        assert_eq!(rounded_sum, dec!(99.99));
    }

    #[test]
    fn test_allocation_of_empty_portfolio_is_undefined() {
        assert_eq!(category_allocation(dec!(10), Decimal::ZERO), None);
    }

    #[test]
    fn test_goal_absent() {
        for total in [Decimal::ZERO, dec!(5000), dec!(-20)] {
            let metrics = GoalMetrics::new(total, None);
            assert_eq!(metrics.achievement_rate, Decimal::ZERO);
            assert_eq!(metrics.distance_to_goal, Decimal::ZERO);
            assert!(!metrics.is_goal_reached);
        }
    }

    #[test]
    fn test_goal_in_progress() {
        let metrics = GoalMetrics::new(dec!(25000), Some(dec!(100000)));
        assert_eq!(metrics.achievement_rate, dec!(25));
        assert_eq!(metrics.distance_to_goal, dec!(75000));
        assert!(!metrics.is_goal_reached);
    }

    #[test]
    fn test_goal_exceeded() {
        let metrics = GoalMetrics::new(dec!(150000), Some(dec!(100000)));
        assert_eq!(metrics.achievement_rate, dec!(150));
        assert_eq!(metrics.distance_to_goal, dec!(-50000));
        assert!(metrics.is_goal_reached);
    }

    #[test]
    fn test_non_positive_goal_has_zero_rate() {
        let metrics = GoalMetrics::new(dec!(10), Some(Decimal::ZERO));
        assert_eq!(metrics.achievement_rate, Decimal::ZERO);
        assert_eq!(metrics.distance_to_goal, dec!(-10));
        assert!(metrics.is_goal_reached);
    }
}
