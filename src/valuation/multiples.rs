use crate::models::{MultiplesAssumptions, Trace};

use super::dcf::FAIR_VALUE_PER_SHARE;
use super::error::ValuationError;

#[derive(Debug, Clone, PartialEq)]
pub struct MultiplesValuation {
    pub fair_value_per_share: f64,
    pub trace: Trace,
}

/// Fair value as the selected P/E multiple times the selected EPS base.
pub fn calculate(assumptions: &MultiplesAssumptions) -> Result<MultiplesValuation, ValuationError> {
    let pe = assumptions.pe_multiple;
    let eps = assumptions.eps_base;
    if !(pe.is_finite() && pe > 0.0) {
        return Err(ValuationError::calculation(format!(
            "P/E multiple must be positive, got {pe}"
        )));
    }
    if !(eps.is_finite() && eps > 0.0) {
        return Err(ValuationError::calculation(format!(
            "EPS base must be positive, got {eps}"
        )));
    }

    let value = pe * eps;
    if !value.is_finite() {
        return Err(ValuationError::calculation(format!(
            "P/E {pe} x EPS {eps} is not finite"
        )));
    }

    let mut trace = Trace::new();
    let fair_value_per_share = trace.record(FAIR_VALUE_PER_SHARE, value);
    Ok(MultiplesValuation {
        fair_value_per_share,
        trace,
    })
}
