use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    Gain,
    Loss,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::Gain => style(text).green().bold(),
        StyleType::Loss => style(text).red().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Style for a gain/loss amount: green above zero, red below, plain at zero.
pub fn gain_loss_style(value: f64) -> StyleType {
    if value > 0.0 {
        StyleType::Gain
    } else if value < 0.0 {
        StyleType::Loss
    } else {
        StyleType::TotalLabel
    }
}

/// Formats a whole-rupee amount with Indian digit grouping, e.g. `₹12,34,567`.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    format!("{sign}{symbol}{grouped}")
}

/// Formats a percentage with an explicit sign, e.g. `+4.20%`.
pub fn format_percentage(percentage: f64) -> String {
    // -0.0 would otherwise print as "+-0.00%"
    let percentage = if percentage == 0.0 { 0.0 } else { percentage };
    let sign = if percentage >= 0.0 { "+" } else { "" };
    format!("{sign}{percentage:.2}%")
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

/// Right-aligned cell for numeric values.
pub fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Creates a cell for a gain/loss amount with its percentage, colour coded.
pub fn gain_loss_cell(amount: f64, percentage: f64, currency: &str) -> Cell {
    let text = format!(
        "{} ({})",
        format_currency(amount, currency),
        format_percentage(percentage)
    );
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if amount > 0.0 {
        cell.fg(Color::Green)
    } else if amount < 0.0 {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64, with_message: bool) -> ProgressBar {
    let template = if with_message {
        "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    } else {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    };

    let pb = ProgressBar::new(len);
    let bar_style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(bar_style);
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_indian_grouping() {
        assert_eq!(format_currency(0.0, "₹"), "₹0");
        assert_eq!(format_currency(999.4, "₹"), "₹999");
        assert_eq!(format_currency(1000.0, "₹"), "₹1,000");
        assert_eq!(format_currency(74500.0, "₹"), "₹74,500");
        assert_eq!(format_currency(123456.0, "₹"), "₹1,23,456");
        assert_eq!(format_currency(1234567.6, "₹"), "₹12,34,568");
        assert_eq!(format_currency(123456789.0, "₹"), "₹12,34,56,789");
        assert_eq!(format_currency(-2850.0, "₹"), "-₹2,850");
        assert_eq!(format_currency(-0.3, "$"), "$0");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(8.724832), "+8.72%");
        assert_eq!(format_percentage(-5.9375), "-5.94%");
        assert_eq!(format_percentage(0.0), "+0.00%");
        assert_eq!(format_percentage(-0.0), "+0.00%");
    }
}
