use std::fmt::Write as _;

use crate::models::{ValuationMethod, ValuationResult};

fn group_int_digits(int_part: &str) -> String {
    // Insert commas every 3 digits.
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

/// Format a currency amount for human display.
///
/// The value is rounded to `decimals` places, the integer part is grouped
/// with `,` when `grouping` is set, and `symbol` is placed after the sign.
pub fn format_currency_display(
    value: f64,
    decimals: usize,
    grouping: bool,
    symbol: Option<&str>,
) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }

    let s = format!("{:.*}", decimals, value.abs());
    let negative = value < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let s = if grouping {
        match s.split_once('.') {
            Some((i, f)) => format!("{}.{f}", group_int_digits(i)),
            None => group_int_digits(&s),
        }
    } else {
        s
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if let Some(sym) = symbol {
        out.push_str(sym);
    }
    out.push_str(&s);
    out
}

/// Compact statement figures: `1.23B`, `456.70M`, `12.00K`, or plain below a thousand.
pub fn format_scaled(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

/// Decimal rate as a percentage, e.g. `0.0325` as `3.25%`.
pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

fn money(value: f64, currency: &str) -> String {
    match currency_symbol(currency) {
        Some(sym) => format_currency_display(value, 2, true, Some(sym)),
        None => format!("{} {currency}", format_currency_display(value, 2, true, None)),
    }
}

/// Plain-text rendering of a valuation for terminal output.
///
/// Rates in the trace are shown as percentages, everything else as grouped
/// amounts. The numbers are the ones on the result; nothing is recomputed
/// beyond the price comparison.
pub fn render_result(result: &ValuationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fair value estimate for {}", result.ticker);
    if let Some(as_of) = result.as_of {
        let _ = writeln!(out, "  As of:      {as_of}");
    }
    let _ = writeln!(
        out,
        "  Method:     {} ({})",
        result.method,
        result.method.description()
    );
    let _ = writeln!(
        out,
        "  Fair value: {}",
        money(result.fair_value_per_share, &result.currency)
    );

    if let Some(price) = result.share_price {
        let _ = writeln!(out, "  Price:      {}", money(price, &result.currency));
    }
    if let Some(upside) = result.upside() {
        let label = if upside >= 0.0 { "discount" } else { "premium" };
        let _ = writeln!(
            out,
            "  Price is at a {:.1}% {label} to fair value",
            (upside.abs() / (1.0 + upside)) * 100.0
        );
    }
    if let Some(reason) = &result.fallback_reason {
        let _ = writeln!(out, "  DCF rejected: {reason}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Computation trace:");
    let width = result
        .trace
        .steps()
        .iter()
        .map(|s| s.label.len())
        .max()
        .unwrap_or(0);
    for step in result.trace.steps() {
        let rendered = if is_rate_label(result.method, &step.label) {
            format_percent(step.value)
        } else {
            format_currency_display(step.value, 2, true, None)
        };
        let _ = writeln!(out, "  {:<width$}  {rendered:>18}", step.label);
    }
    out
}

fn is_rate_label(method: ValuationMethod, label: &str) -> bool {
    method == ValuationMethod::Dcf && label == "cost_of_equity"
}
