//! Financial-soundness predicates applied to DCF inputs.
//!
//! Each rule returns `Ok(())` or a [`RuleViolation`] naming the rule, and the
//! engine evaluates them in the order: data sufficiency, beta presence, growth
//! bounds, positive cost of equity, Ke-vs-g spread.

use crate::models::AnnualStatement;

pub const FCFE_INPUTS_PRESENT: &str = "fcfe_inputs_present";
pub const BETA_PRESENT_AND_FINITE: &str = "beta_present_and_finite";
pub const GROWTH_RATES_BOUNDED: &str = "growth_rates_bounded";
pub const COST_OF_EQUITY_POSITIVE: &str = "cost_of_equity_positive";
pub const COST_OF_EQUITY_EXCEEDS_GROWTH: &str = "cost_of_equity_exceeds_growth";
pub const DCF_FAIR_VALUE_NON_NEGATIVE: &str = "dcf_fair_value_non_negative";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{rule}: {reason}")]
pub struct RuleViolation {
    pub rule: &'static str,
    pub reason: String,
}

impl RuleViolation {
    fn new(rule: &'static str, reason: impl Into<String>) -> Self {
        Self {
            rule,
            reason: reason.into(),
        }
    }
}

pub type RuleResult = Result<(), RuleViolation>;

/// The base-year statement carries everything FCFE0 needs.
pub fn fcfe_inputs_present(statement: Option<&AnnualStatement>) -> RuleResult {
    let Some(statement) = statement else {
        return Err(RuleViolation::new(
            FCFE_INPUTS_PRESENT,
            "no annual statement available for the base year",
        ));
    };

    let mut missing = Vec::new();
    if !statement.net_income.is_some_and(f64::is_finite) {
        missing.push("net income");
    }
    let adjustments = [
        ("depreciation/amortization", statement.depreciation_amortization),
        ("capital expenditure", statement.capital_expenditure),
        ("change in working capital", statement.change_in_working_capital),
        ("net borrowing", statement.net_borrowing),
    ];
    for (name, item) in adjustments {
        if !item.is_some_and(|i| i.value().is_finite()) {
            missing.push(name);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RuleViolation::new(
            FCFE_INPUTS_PRESENT,
            format!(
                "fiscal year {} is missing {}",
                statement.fiscal_year,
                missing.join(", ")
            ),
        ))
    }
}

pub fn beta_present_and_finite(beta: Option<f64>) -> RuleResult {
    match beta {
        Some(b) if b.is_finite() => Ok(()),
        Some(b) => Err(RuleViolation::new(
            BETA_PRESENT_AND_FINITE,
            format!("beta {b} is not a finite number"),
        )),
        None => Err(RuleViolation::new(
            BETA_PRESENT_AND_FINITE,
            "beta is not available",
        )),
    }
}

pub fn growth_rates_bounded(rates: &[f64], lower: f64, upper: f64) -> RuleResult {
    for (i, rate) in rates.iter().enumerate() {
        if !rate.is_finite() || *rate < lower || *rate > upper {
            return Err(RuleViolation::new(
                GROWTH_RATES_BOUNDED,
                format!(
                    "year {} growth {:.2}% is outside [{:.2}%, {:.2}%]",
                    i + 1,
                    rate * 100.0,
                    lower * 100.0,
                    upper * 100.0
                ),
            ));
        }
    }
    Ok(())
}

/// The perpetual rate sits inside the same band as the stage-1 rates.
pub fn perpetual_growth_bounded(g: f64, lower: f64, upper: f64) -> RuleResult {
    if g.is_finite() && (lower..=upper).contains(&g) {
        Ok(())
    } else {
        Err(RuleViolation::new(
            GROWTH_RATES_BOUNDED,
            format!(
                "perpetual growth {:.2}% is outside [{:.2}%, {:.2}%]",
                g * 100.0,
                lower * 100.0,
                upper * 100.0
            ),
        ))
    }
}

pub fn cost_of_equity_positive(ke: f64) -> RuleResult {
    if ke.is_finite() && ke > 0.0 {
        Ok(())
    } else {
        Err(RuleViolation::new(
            COST_OF_EQUITY_POSITIVE,
            format!("cost of equity {:.2}% must be positive", ke * 100.0),
        ))
    }
}

pub fn cost_of_equity_exceeds_growth(ke: f64, g: f64, min_spread: f64) -> RuleResult {
    let spread = ke - g;
    // NaN fails the comparison and is rejected with the rest.
    if spread >= min_spread {
        Ok(())
    } else {
        Err(RuleViolation::new(
            COST_OF_EQUITY_EXCEEDS_GROWTH,
            format!(
                "perpetual growth {:.2}% must trail cost of equity {:.2}% by at least {:.2}% (spread {:.2}%)",
                g * 100.0,
                ke * 100.0,
                min_spread * 100.0,
                spread * 100.0
            ),
        ))
    }
}

pub fn dcf_fair_value_non_negative(fair_value: f64) -> RuleResult {
    if fair_value >= 0.0 {
        Ok(())
    } else {
        Err(RuleViolation::new(
            DCF_FAIR_VALUE_NON_NEGATIVE,
            format!("DCF fair value per share is negative ({fair_value:.2})"),
        ))
    }
}
