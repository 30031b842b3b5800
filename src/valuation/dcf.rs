//! Two-stage free-cash-flow-to-equity valuation.
//!
//! Stage 1 projects FCFE explicitly for each year of the horizon; stage 2 is a
//! Gordon-growth terminal value on the last projected year. Every intermediate
//! figure is appended to the trace in computation order.

use crate::models::{AnnualStatement, DcfAssumptions, Trace};

use super::error::ValuationError;

pub const FCFE_0: &str = "fcfe_0";
pub const COST_OF_EQUITY: &str = "cost_of_equity";
pub const PV_STAGE_1: &str = "pv_stage_1";
pub const TERMINAL_VALUE: &str = "terminal_value";
pub const PV_TERMINAL_VALUE: &str = "pv_terminal_value";
pub const EQUITY_VALUE: &str = "equity_value";
pub const FAIR_VALUE_PER_SHARE: &str = "fair_value_per_share";

pub fn fcfe_label(year: usize) -> String {
    format!("fcfe_{year}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct DcfValuation {
    pub fair_value_per_share: f64,
    pub equity_value: f64,
    pub trace: Trace,
}

fn finite(label: &str, value: f64) -> Result<f64, ValuationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValuationError::calculation(format!(
            "{label} is not finite ({value})"
        )))
    }
}

/// Base-year FCFE: net income + |D&A| - |capex| - increase in working capital + net borrowing.
///
/// Absent adjustments are an error here; callers run the data-sufficiency rule first.
pub fn base_fcfe(statement: &AnnualStatement) -> Result<f64, ValuationError> {
    let missing = |name: &str| {
        ValuationError::DataInsufficient(format!(
            "fiscal year {} has no {name}",
            statement.fiscal_year
        ))
    };
    let net_income = statement.net_income.ok_or_else(|| missing("net income"))?;
    let da = statement
        .depreciation_amortization
        .ok_or_else(|| missing("depreciation/amortization"))?
        .value();
    let capex = statement
        .capital_expenditure
        .ok_or_else(|| missing("capital expenditure"))?
        .value();
    let nwc = statement
        .change_in_working_capital
        .ok_or_else(|| missing("change in working capital"))?
        .value();
    let borrowing = statement
        .net_borrowing
        .ok_or_else(|| missing("net borrowing"))?
        .value();

    finite(
        FCFE_0,
        net_income + da.abs() - capex.abs() - nwc + borrowing,
    )
}

/// Value equity from a base FCFE and validated assumptions.
///
/// Errors rather than returning a non-finite value; a negative fair value is
/// returned as-is for the caller's post-calculation check.
pub fn calculate(
    fcfe_0: f64,
    beta: f64,
    diluted_shares: f64,
    assumptions: &DcfAssumptions,
) -> Result<DcfValuation, ValuationError> {
    if !(diluted_shares.is_finite() && diluted_shares > 0.0) {
        return Err(ValuationError::calculation(format!(
            "diluted share count must be positive, got {diluted_shares}"
        )));
    }
    if assumptions.growth_rates.is_empty() {
        return Err(ValuationError::calculation(
            "at least one stage-1 growth rate is required",
        ));
    }

    let mut trace = Trace::new();
    let mut fcfe = trace.record(FCFE_0, finite(FCFE_0, fcfe_0)?);

    let mut projected = Vec::with_capacity(assumptions.growth_rates.len());
    for (i, growth) in assumptions.growth_rates.iter().enumerate() {
        let label = fcfe_label(i + 1);
        fcfe = trace.record(label.clone(), finite(&label, fcfe * (1.0 + growth))?);
        projected.push(fcfe);
    }

    let ke = trace.record(
        COST_OF_EQUITY,
        finite(COST_OF_EQUITY, assumptions.cost_of_equity(beta))?,
    );
    let g = assumptions.perpetual_growth_rate;
    if !(ke - g > 0.0) {
        return Err(ValuationError::calculation(format!(
            "cost of equity {ke} does not exceed perpetual growth {g}"
        )));
    }
    if !(1.0 + ke > 0.0) {
        return Err(ValuationError::calculation(format!(
            "discount factor base 1 + Ke must be positive, got {}",
            1.0 + ke
        )));
    }

    let pv_stage_1: f64 = projected
        .iter()
        .enumerate()
        .map(|(i, cash)| cash / (1.0 + ke).powi(i as i32 + 1))
        .sum();
    let pv_stage_1 = trace.record(PV_STAGE_1, finite(PV_STAGE_1, pv_stage_1)?);

    let horizon = projected.len() as i32;
    let terminal = trace.record(
        TERMINAL_VALUE,
        finite(TERMINAL_VALUE, fcfe * (1.0 + g) / (ke - g))?,
    );
    let pv_terminal = trace.record(
        PV_TERMINAL_VALUE,
        finite(PV_TERMINAL_VALUE, terminal / (1.0 + ke).powi(horizon))?,
    );

    let equity_value = trace.record(
        EQUITY_VALUE,
        finite(EQUITY_VALUE, pv_stage_1 + pv_terminal)?,
    );
    let fair_value_per_share = trace.record(
        FAIR_VALUE_PER_SHARE,
        finite(FAIR_VALUE_PER_SHARE, equity_value / diluted_shares)?,
    );

    Ok(DcfValuation {
        fair_value_per_share,
        equity_value,
        trace,
    })
}
