use super::ui;
use crate::core::analytics::{self, PortfolioHistory};
use crate::core::currency::RateProvider;
use crate::core::rebalance::{RebalanceAdjustment, rebalance};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use rust_decimal::Decimal;

fn display_rebalance_table(currency: &str, adjustments: &[RebalanceAdjustment]) -> String {
    if adjustments.is_empty() {
        return ui::style_text(
            "No category has a target allocation, nothing to rebalance",
            ui::StyleType::Subtle,
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Current ({currency})")),
        ui::header_cell(&format!("Target ({currency})")),
        ui::header_cell("Adjustment"),
        ui::header_cell("Action"),
    ]);

    for adjustment in adjustments {
        let amount = adjustment.adjustment_amount.round_dp(2);
        let action = if amount > Decimal::ZERO {
            "Buy"
        } else if amount < Decimal::ZERO {
            "Sell"
        } else {
            "Hold"
        };
        table.add_row(vec![
            Cell::new(&adjustment.category),
            ui::amount_cell(adjustment.current_value),
            ui::amount_cell(adjustment.target_value),
            ui::signed_amount_cell(adjustment.adjustment_amount),
            Cell::new(action),
        ]);
    }

    table.to_string()
}

pub async fn render(
    history: &PortfolioHistory,
    rate_provider: &(dyn RateProvider + Send + Sync),
    target_currency: &str,
    date: Option<NaiveDate>,
) -> Result<String> {
    let valuation = super::valuate(history, date, rate_provider, target_currency).await?;
    let breakdown = analytics::category_breakdown(&valuation, history);
    let inputs = analytics::rebalancing_inputs(&breakdown);
    let adjustments = rebalance(&inputs, valuation.total_value);

    let mut output = format!(
        "Rebalancing on {}\n\n{}",
        ui::style_text(&valuation.snapshot.date.to_string(), ui::StyleType::Title),
        display_rebalance_table(target_currency, &adjustments)
    );

    let targeted: Decimal = inputs.iter().filter_map(|i| i.target_percentage).sum();
    if !adjustments.is_empty() && targeted != Decimal::ONE_HUNDRED {
        output.push('\n');
        output.push_str(&ui::style_text(
            &format!("Targets add up to {}", ui::format_percent(targeted)),
            ui::StyleType::Error,
        ));
    }
    Ok(output)
}
