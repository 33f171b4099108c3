use super::ui;
use crate::core::analytics::{self, CategoryAllocation, PortfolioHistory};
use crate::core::currency::RateProvider;
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Attribute, Cell, Color};
use rust_decimal::Decimal;

fn display_allocation_table(
    date: NaiveDate,
    currency: &str,
    breakdown: &[CategoryAllocation],
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Value ({currency})")),
        ui::header_cell("Allocation"),
        ui::header_cell("Target"),
        ui::header_cell("Drift"),
    ]);

    for category in breakdown {
        let name = if category.name == analytics::UNCATEGORIZED {
            Cell::new(&category.name).fg(Color::DarkGrey)
        } else {
            Cell::new(&category.name).add_attribute(Attribute::Bold)
        };
        let drift = match (category.allocation, category.target) {
            (Some(actual), Some(target)) => {
                let drift = actual - target;
                let color = if drift.abs() < Decimal::ONE {
                    Color::Green
                } else {
                    Color::Yellow
                };
                Cell::new(ui::format_percent(drift)).fg(color)
            }
            _ => ui::na_cell(),
        };

        table.add_row(vec![
            name,
            ui::amount_cell(category.value),
            ui::format_optional_cell(category.allocation, ui::format_percent),
            ui::format_optional_cell(category.target, ui::format_percent),
            drift,
        ]);
    }

    format!(
        "Allocation on {}\n\n{table}",
        ui::style_text(&date.to_string(), ui::StyleType::Title)
    )
}

pub async fn render(
    history: &PortfolioHistory,
    rate_provider: &(dyn RateProvider + Send + Sync),
    target_currency: &str,
    date: Option<NaiveDate>,
) -> Result<String> {
    let valuation = super::valuate(history, date, rate_provider, target_currency).await?;
    let breakdown = analytics::category_breakdown(&valuation, history);

    let mut output =
        display_allocation_table(valuation.snapshot.date, target_currency, &breakdown);
    if valuation.total_value.is_zero() {
        output.push('\n');
        output.push_str(&ui::style_text(
            "Portfolio is empty, allocation is undefined",
            ui::StyleType::Subtle,
        ));
    }
    Ok(output)
}
