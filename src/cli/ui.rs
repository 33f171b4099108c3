use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an amount with two decimals.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Formats a fraction (0.1) as a percentage ("10.00%").
pub fn format_rate(rate: Decimal) -> String {
    format_percent(rate * dec!(100))
}

/// Formats a value already expressed in percent.
pub fn format_percent(percent: Decimal) -> String {
    format!("{:.2}%", percent.round_dp(2))
}

/// Right-aligned cell for an amount.
pub fn amount_cell(value: Decimal) -> Cell {
    Cell::new(format_amount(value)).set_alignment(CellAlignment::Right)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or_else(na_cell, |v| {
        Cell::new(format_fn(v)).set_alignment(CellAlignment::Right)
    })
}

/// Creates a cell for a signed fraction (return, adjustment share) with
/// color coding. `None` renders as "N/A".
pub fn change_cell(rate: Option<Decimal>) -> Cell {
    let Some(rate) = rate else {
        return na_cell();
    };
    let color = if rate >= Decimal::ZERO {
        Color::Green
    } else {
        Color::Red
    };
    Cell::new(format_rate(rate))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Creates a cell for a signed amount with color coding.
pub fn signed_amount_cell(value: Decimal) -> Cell {
    let text = if value > Decimal::ZERO {
        format!("+{}", format_amount(value))
    } else {
        format_amount(value)
    };
    let color = if value >= Decimal::ZERO {
        Color::Green
    } else {
        Color::Red
    };
    Cell::new(text)
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Dimmed "N/A" cell for undefined values.
pub fn na_cell() -> Cell {
    Cell::new("N/A")
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64, with_message: bool) -> ProgressBar {
    let template = if with_message {
        "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    } else {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    };

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_values_render_as_na() {
        assert_eq!(change_cell(None).content(), "N/A");
        assert_eq!(
            format_optional_cell(None::<Decimal>, format_amount).content(),
            "N/A"
        );
        assert_eq!(change_cell(Some(dec!(0.05))).content(), "5.00%");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_amount(dec!(1234.5)), "1234.50");
        assert_eq!(format_amount(dec!(-10000)), "-10000.00");
        assert_eq!(format_rate(dec!(0.12346)), "12.35%");
        assert_eq!(format_percent(dec!(33.3333)), "33.33%");
    }
}
