use super::ui;
use crate::core::currency::RateProvider;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::collections::BTreeMap;

fn display_currency_table(currencies: &BTreeMap<String, String>, highlight: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Code"), ui::header_cell("Name")]);
    for (code, name) in currencies {
        let code_cell = if code == highlight {
            Cell::new(code).fg(comfy_table::Color::Green)
        } else {
            Cell::new(code)
        };
        table.add_row(vec![code_cell, Cell::new(name)]);
    }
    table.to_string()
}

pub async fn render(
    rate_provider: &(dyn RateProvider + Send + Sync),
    target_currency: &str,
) -> Result<String> {
    let currencies = rate_provider
        .fetch_currency_list()
        .await
        .context("Failed to fetch supported currencies")?;

    let mut output = display_currency_table(&currencies, target_currency);
    if !currencies.contains_key(target_currency) {
        output.push('\n');
        output.push_str(&ui::style_text(
            &format!("Display currency {target_currency} is not supported by the rate provider"),
            ui::StyleType::Error,
        ));
    }
    Ok(output)
}
