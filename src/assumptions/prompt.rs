//! Prompt text for reasoning-model providers.

use std::fmt::Write as _;

use super::parsing::{
    KEY_EPS, KEY_EPS_TYPE, KEY_GROWTH_RATES, KEY_PERPETUAL_GROWTH, KEY_PE_MULTIPLE, KEY_PE_TYPE,
};
use crate::format::{format_currency_display, format_percent, format_scaled};
use crate::models::{AssumptionKind, AssumptionRequest, SnapshotSummary};

pub fn prompt_for(request: &AssumptionRequest) -> String {
    match request.kind {
        AssumptionKind::Dcf => dcf_prompt(request),
        AssumptionKind::Multiples => multiples_prompt(request),
    }
}

fn optional(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| "N/A".to_string())
}

fn header(summary: &SnapshotSummary, task: &str) -> String {
    format!(
        "You are an equity analyst. {task} for {}, sector: {}. Reporting currency: {}.",
        summary.display_name,
        summary.sector.as_deref().unwrap_or("N/A"),
        summary.currency,
    )
}

/// Revenue, net income and capex for the most recent years.
pub fn trend_summary(summary: &SnapshotSummary) -> String {
    if summary.trend.is_empty() {
        return "No historical financial trends available.".to_string();
    }
    let mut out = String::from("Recent financial trends (newest first):");
    for row in &summary.trend {
        let _ = write!(
            out,
            "\n- FY{}: revenue {}, net income {}, capex {}",
            row.fiscal_year,
            optional(row.revenue, format_scaled),
            optional(row.net_income, format_scaled),
            optional(row.capital_expenditure, format_scaled),
        );
    }
    out
}

pub fn news_summary(summary: &SnapshotSummary) -> String {
    if summary.headlines.is_empty() {
        return "No recent news headlines.".to_string();
    }
    let mut out = String::from("Recent headlines:");
    for headline in &summary.headlines {
        let _ = write!(out, "\n- {headline}");
    }
    out
}

pub fn dcf_prompt(request: &AssumptionRequest) -> String {
    let summary = &request.summary;
    let n = request.horizon_years;
    let example: Vec<String> = (0..n).map(|i| format!("{:.1}", 10.0 - i as f64)).collect();

    let mut out = header(summary, "Provide two-stage FCFE DCF assumptions");
    let _ = write!(
        out,
        "\nBase FCFE_0: {}. Stage 1 length: {n} years.",
        optional(request.base_fcfe, |v| format_currency_display(v, 2, true, None)),
    );
    let _ = write!(
        out,
        "\nRisk-free rate: {}. Equity risk premium: {}. Beta: {}. Cost of equity (Ke): {}.",
        format_percent(request.market.risk_free_rate),
        format_percent(request.market.equity_risk_premium),
        optional(request.beta, |b| format!("{b:.3}")),
        optional(request.cost_of_equity_hint(), format_percent),
    );
    let _ = write!(out, "\n\n{}\n\n{}", trend_summary(summary), news_summary(summary));
    let _ = write!(
        out,
        "\n\nRespond with a single JSON object with these keys:\n\
         - \"{KEY_GROWTH_RATES}\": list of exactly {n} numbers in percent, e.g. [{}]\n\
         - \"justification_stage_1_growth\": string\n\
         - \"{KEY_PERPETUAL_GROWTH}\": number in percent, e.g. 2.5\n\
         - \"justification_perpetual_growth\": string\n\
         - \"justification_ke\": string\n\
         Percentages are plain numbers. The perpetual growth rate must be below Ke by at least {}.\n\
         Keep justifications concise.",
        example.join(", "),
        format_percent(request.min_ke_g_spread),
    );
    out
}

pub fn multiples_prompt(request: &AssumptionRequest) -> String {
    let summary = &request.summary;
    let mut out = header(summary, "Select P/E multiples assumptions");
    let _ = write!(
        out,
        "\nShare price: {}. Trailing P/E: {}. Forward P/E: {}. Trailing EPS: {}. Forward EPS: {}.",
        optional(summary.share_price, |v| format!("{v:.2}")),
        optional(summary.trailing_pe, |v| format!("{v:.2}")),
        optional(summary.forward_pe, |v| format!("{v:.2}")),
        optional(summary.trailing_eps, |v| format!("{v:.2}")),
        optional(summary.forward_eps, |v| format!("{v:.2}")),
    );
    let _ = write!(out, "\n\n{}\n\n{}", trend_summary(summary), news_summary(summary));
    let _ = write!(
        out,
        "\n\nRespond with a single JSON object with these keys:\n\
         - \"{KEY_PE_MULTIPLE}\": number, e.g. 20.5\n\
         - \"{KEY_PE_TYPE}\": string, e.g. \"forward\"\n\
         - \"justification_pe_multiple\": string\n\
         - \"{KEY_EPS}\": number, e.g. 3.42\n\
         - \"{KEY_EPS_TYPE}\": string, e.g. \"trailing\"\n\
         - \"justification_eps_selection\": string\n\
         Use null for a value that cannot be determined. Keep justifications concise."
    );
    out
}
