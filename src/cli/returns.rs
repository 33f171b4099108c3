use super::ui;
use crate::core::analytics::{self, PortfolioHistory};
use crate::core::currency::RateProvider;
use crate::core::performance::{HistoricalPeriod, PerformanceReport};
use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell};
use rust_decimal::Decimal;
use tracing::info;

impl PerformanceReport {
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("From"),
            ui::header_cell("To"),
            ui::header_cell(&format!("Start ({currency})")),
            ui::header_cell(&format!("End ({currency})")),
            ui::header_cell("Net Flow"),
            ui::header_cell("Return"),
        ]);

        for period in &self.periods {
            table.add_row(vec![
                Cell::new(period.start),
                Cell::new(period.end),
                ui::amount_cell(period.begin_value),
                ui::amount_cell(period.end_value),
                ui::signed_amount_cell(period.net_cash_flow),
                ui::change_cell(period.return_rate),
            ]);
        }

        let mut summary = ui::new_styled_table();
        summary.set_header(
            std::iter::once(ui::header_cell("Metric"))
                .chain(HistoricalPeriod::ALL.iter().map(|p| ui::header_cell(&p.to_string())))
                .collect::<Vec<_>>(),
        );
        let mut growth_row = vec![Cell::new("Growth").add_attribute(Attribute::Bold)];
        growth_row.extend(
            HistoricalPeriod::ALL
                .iter()
                .map(|p| ui::change_cell(self.growth.get(p).copied().flatten())),
        );
        summary.add_row(growth_row);

        let mut output = String::new();
        if self.periods.is_empty() {
            output.push_str(&ui::style_text(
                "At least two snapshots are needed to measure returns",
                ui::StyleType::Subtle,
            ));
        } else {
            output.push_str(&table.to_string());
        }
        output.push_str("\n\n");
        output.push_str(&summary.to_string());
        output.push_str(&format!(
            "\n\n{}: {}\n{}: {}",
            ui::style_text("Time-weighted return", ui::StyleType::TotalLabel),
            format_optional_rate(self.cumulative_twr),
            ui::style_text("CAGR", ui::StyleType::TotalLabel),
            format_optional_rate(self.cagr),
        ));
        output
    }
}

fn format_optional_rate(rate: Option<Decimal>) -> String {
    rate.map_or_else(
        || ui::style_text("N/A", ui::StyleType::Subtle),
        ui::format_rate,
    )
}

pub async fn render(
    history: &PortfolioHistory,
    rate_provider: &(dyn RateProvider + Send + Sync),
    target_currency: &str,
) -> Result<String> {
    info!("Calculating portfolio returns...");

    let pb = ui::new_progress_bar(history.snapshots.len() as u64, true);
    pb.set_message("Valuing snapshots...");
    let points =
        analytics::value_history(history, rate_provider, target_currency, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    let points = points.context("Failed to value portfolio history")?;
    let report = PerformanceReport::from_points(&points);
    Ok(report.display_as_table(target_currency))
}
