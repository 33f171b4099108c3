use super::ui;
use crate::core::allocation::{GoalMetrics, category_allocation};
use crate::core::analytics::{PortfolioHistory, SnapshotValuation};
use crate::core::currency::RateProvider;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use rust_decimal::Decimal;

impl SnapshotValuation {
    pub fn display_as_table(&self, goal: Option<Decimal>) -> String {
        let currency = &self.currency;

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Asset"),
            ui::header_cell("Platform"),
            ui::header_cell("Value"),
            ui::header_cell(&format!("Value ({currency})")),
            ui::header_cell("Weight (%)"),
            ui::header_cell("Source"),
        ]);

        for holding in &self.holdings {
            let platform = if holding.asset.platform.is_empty() {
                ui::style_text("(unnamed)", ui::StyleType::Subtle)
            } else {
                holding.asset.platform.clone()
            };
            let native_value = format!(
                "{} {}",
                ui::format_amount(holding.composite.market_value),
                holding.asset.currency
            );
            let weight = ui::format_optional_cell(
                category_allocation(holding.converted_value, self.total_value),
                ui::format_percent,
            );
            let source = match holding.composite.source_date {
                Some(date) if holding.composite.is_carried_forward => ui::style_text(
                    &format!("Carried from {date}"),
                    ui::StyleType::Subtle,
                ),
                _ => "Direct".to_string(),
            };

            table.add_row(vec![
                Cell::new(&holding.asset.name),
                Cell::new(platform),
                Cell::new(native_value),
                ui::amount_cell(holding.converted_value),
                weight,
                Cell::new(source),
            ]);
        }

        let mut output = format!(
            "Snapshot: {}\n\n",
            ui::style_text(&self.snapshot.date.to_string(), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nTotal Value ({}): {}",
            ui::style_text(currency, ui::StyleType::TotalLabel),
            ui::style_text(&ui::format_amount(self.total_value), ui::StyleType::TotalValue)
        ));

        let carried = self.carried_count();
        if carried > 0 {
            output.push_str(&ui::style_text(
                &format!("\n{carried} value(s) carried forward from earlier snapshots"),
                ui::StyleType::Subtle,
            ));
        }

        if goal.is_some() {
            let metrics = GoalMetrics::new(self.total_value, goal);
            let status = if metrics.is_goal_reached {
                ui::style_text("reached", ui::StyleType::TotalValue)
            } else {
                format!("{} to go", ui::format_amount(metrics.distance_to_goal))
            };
            output.push_str(&format!(
                "\nGoal: {} ({status})",
                ui::format_percent(metrics.achievement_rate)
            ));
        }

        output
    }
}

pub async fn render(
    history: &PortfolioHistory,
    rate_provider: &(dyn RateProvider + Send + Sync),
    target_currency: &str,
    goal: Option<Decimal>,
    date: Option<NaiveDate>,
) -> Result<String> {
    let valuation = super::valuate(history, date, rate_provider, target_currency).await?;
    Ok(valuation.display_as_table(goal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analytics::HoldingValue;
    use crate::core::model::{Asset, CompositeValue, Snapshot};
    use rust_decimal_macros::dec;

    fn holding(id: &str, platform: &str, value: Decimal, source: Option<NaiveDate>) -> HoldingValue {
        HoldingValue {
            asset: Asset {
                id: id.to_string(),
                name: id.to_uppercase(),
                platform: platform.to_string(),
                category: None,
                currency: "USD".to_string(),
            },
            composite: CompositeValue {
                asset_id: id.to_string(),
                market_value: value,
                is_carried_forward: source.is_some(),
                source_date: source,
            },
            converted_value: value,
        }
    }

    fn valuation() -> SnapshotValuation {
        let feb = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        SnapshotValuation {
            snapshot: Snapshot {
                id: "mar".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            },
            currency: "USD".to_string(),
            holdings: vec![
                holding("aapl", "Broker", dec!(16000), None),
                holding("btc", "Coinbase", dec!(50000), Some(feb)),
            ],
            total_value: dec!(66000),
        }
    }

    #[test]
    fn test_display_marks_carried_values() {
        let output = valuation().display_as_table(None);

        assert!(output.contains("AAPL"));
        assert!(output.contains("Direct"));
        assert!(output.contains("Carried from 2024-02-29"));
        assert!(output.contains("66000.00"));
        assert!(output.contains("1 value(s) carried forward"));
        assert!(!output.contains("Goal:"));
    }

    #[test]
    fn test_display_goal_progress() {
        let output = valuation().display_as_table(Some(dec!(100000)));
        assert!(output.contains("Goal: 66.00%"));
        assert!(output.contains("34000.00 to go"));

        let output = valuation().display_as_table(Some(dec!(50000)));
        assert!(output.contains("Goal: 132.00%"));
        assert!(output.contains("reached"));
    }
}
