//! Monetary moves that bring each category back to its target share.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceInput {
    pub category: String,
    pub current_value: Decimal,
    /// Target share in percent; categories without one are not rebalanced.
    pub target_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebalanceAdjustment {
    pub category: String,
    pub current_value: Decimal,
    pub target_value: Decimal,
    /// Positive: add funds to the category. Negative: take funds out.
    pub adjustment_amount: Decimal,
}

pub fn rebalance(inputs: &[RebalanceInput], total_value: Decimal) -> Vec<RebalanceAdjustment> {
    inputs
        .iter()
        .filter_map(|input| {
            let target = input.target_percentage?;
            let target_value = total_value * target / dec!(100);
            Some(RebalanceAdjustment {
                category: input.category.clone(),
                current_value: input.current_value,
                target_value,
                adjustment_amount: target_value - input.current_value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(category: &str, current_value: Decimal, target: Option<Decimal>) -> RebalanceInput {
        RebalanceInput {
            category: category.to_string(),
            current_value,
            target_percentage: target,
        }
    }

    #[test]
    fn test_rebalance_moves_towards_targets() {
        let inputs = [
            input("Equity", dec!(50000), Some(dec!(60))),
            input("Bonds", dec!(50000), Some(dec!(40))),
        ];

        let adjustments = rebalance(&inputs, dec!(100000));

        assert_eq!(adjustments.len(), 2);
        assert_eq!(adjustments[0].category, "Equity");
        assert_eq!(adjustments[0].adjustment_amount, dec!(10000));
        assert_eq!(adjustments[0].target_value, dec!(60000));
        assert_eq!(adjustments[1].adjustment_amount, dec!(-10000));
    }

    #[test]
    fn test_categories_without_target_are_excluded() {
        let inputs = [
            input("Equity", dec!(70000), Some(dec!(70))),
            input("Collectibles", dec!(30000), None),
        ];

        let adjustments = rebalance(&inputs, dec!(100000));

        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].category, "Equity");
        assert!(adjustments[0].adjustment_amount.is_zero());
    }
}
