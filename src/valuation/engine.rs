use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::ValuationError;
use super::{dcf, multiples, rules};
use crate::assumptions::{AssumptionProvider, CallPolicy};
use crate::models::{
    AssumptionKind, AssumptionRequest, Assumptions, FinancialSnapshot, MarketInputs,
    SnapshotSummary, Trace, ValuationMethod, ValuationResult,
};

/// Methods tried in order until one produces a value.
pub const METHOD_CHAIN: [ValuationMethod; 2] = [ValuationMethod::Dcf, ValuationMethod::Multiples];

/// Longest explicit projection the engine accepts.
pub const MAX_HORIZON_YEARS: usize = 30;

/// Knobs injected into the engine at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub horizon_years: usize,
    pub min_ke_g_spread: f64,
    pub growth_lower_bound: f64,
    pub growth_upper_bound: f64,
    pub market: MarketInputs,
    pub call_policy: CallPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            horizon_years: 5,
            min_ke_g_spread: 0.01,
            growth_lower_bound: -0.5,
            growth_upper_bound: 1.0,
            market: MarketInputs {
                risk_free_rate: 0.045,
                equity_risk_premium: 0.045,
            },
            call_policy: CallPolicy::new(Duration::from_secs(30), 1),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValuationError> {
        let invalid = |msg: String| Err(ValuationError::InvalidConfig(msg));
        if !(1..=MAX_HORIZON_YEARS).contains(&self.horizon_years) {
            return invalid(format!(
                "horizon_years must be between 1 and {MAX_HORIZON_YEARS}, got {}",
                self.horizon_years
            ));
        }
        let rates = [
            ("min_ke_g_spread", self.min_ke_g_spread),
            ("growth_lower_bound", self.growth_lower_bound),
            ("growth_upper_bound", self.growth_upper_bound),
            ("risk_free_rate", self.market.risk_free_rate),
            ("equity_risk_premium", self.market.equity_risk_premium),
        ];
        for (name, value) in rates {
            if !value.is_finite() {
                return invalid(format!("{name} must be a finite number"));
            }
        }
        if self.min_ke_g_spread <= 0.0 {
            return invalid(format!(
                "min_ke_g_spread must be positive, got {}",
                self.min_ke_g_spread
            ));
        }
        if self.growth_lower_bound >= self.growth_upper_bound {
            return invalid(format!(
                "growth_lower_bound ({}) must be below growth_upper_bound ({})",
                self.growth_lower_bound, self.growth_upper_bound
            ));
        }
        Ok(())
    }
}

/// What a successful method hands back to the engine.
struct MethodOutcome {
    fair_value_per_share: f64,
    assumptions: Assumptions,
    trace: Trace,
}

pub struct ValuationEngine {
    provider: Arc<dyn AssumptionProvider>,
    config: EngineConfig,
}

impl ValuationEngine {
    /// Build an engine, rejecting settings no valuation could run under.
    pub fn new(
        provider: Arc<dyn AssumptionProvider>,
        config: EngineConfig,
    ) -> Result<Self, ValuationError> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Estimate a per-share fair value, trying DCF first and multiples second.
    pub async fn estimate(
        &self,
        snapshot: &FinancialSnapshot,
    ) -> Result<ValuationResult, ValuationError> {
        check_preconditions(snapshot)?;

        let mut failures: Vec<(ValuationMethod, ValuationError)> = Vec::new();
        for (i, method) in METHOD_CHAIN.iter().copied().enumerate() {
            let is_last = i + 1 == METHOD_CHAIN.len();
            let attempt = match method {
                ValuationMethod::Dcf => self.attempt_dcf(snapshot).await,
                ValuationMethod::Multiples => self.attempt_multiples(snapshot).await,
            };

            match attempt {
                Ok(outcome) => {
                    let fallback_reason = failures.first().map(|(_, err)| err.fallback_reason());
                    info!(
                        ticker = %snapshot.ticker,
                        method = %method,
                        fair_value = outcome.fair_value_per_share,
                        fallback = fallback_reason.as_ref().map(|r| r.rule.as_str()),
                        "fair value estimated"
                    );
                    return Ok(ValuationResult {
                        ticker: snapshot.ticker.clone(),
                        currency: snapshot.currency.clone(),
                        as_of: snapshot.as_of,
                        method,
                        fair_value_per_share: outcome.fair_value_per_share,
                        share_price: snapshot.share_price,
                        assumptions: outcome.assumptions,
                        trace: outcome.trace,
                        fallback_reason,
                    });
                }
                Err(err) if err.is_recoverable() && !is_last => {
                    let reason = err.fallback_reason();
                    warn!(
                        ticker = %snapshot.ticker,
                        method = %method,
                        rule = %reason.rule,
                        detail = %reason.detail,
                        "valuation method rejected, falling back"
                    );
                    failures.push((method, err));
                }
                Err(err) => return Err(terminal_error(method, err, &failures)),
            }
        }

        // METHOD_CHAIN is non-empty, so the last iteration always returns.
        Err(ValuationError::calculation("no valuation method available"))
    }

    fn summary(&self, snapshot: &FinancialSnapshot) -> SnapshotSummary {
        SnapshotSummary::from_snapshot(snapshot)
    }

    async fn attempt_dcf(&self, snapshot: &FinancialSnapshot) -> Result<MethodOutcome, ValuationError> {
        let cfg = &self.config;

        rules::fcfe_inputs_present(snapshot.latest_statement())?;
        rules::beta_present_and_finite(snapshot.beta)?;
        let (Some(statement), Some(beta), Some(shares)) = (
            snapshot.latest_statement(),
            snapshot.beta,
            snapshot.diluted_shares_outstanding,
        ) else {
            return Err(ValuationError::DataInsufficient(
                "DCF inputs disappeared after validation".to_string(),
            ));
        };

        let fcfe_0 = dcf::base_fcfe(statement)?;
        debug!(ticker = %snapshot.ticker, fcfe_0, beta, "requesting DCF assumptions");

        let request = AssumptionRequest::dcf(
            self.summary(snapshot),
            cfg.horizon_years,
            cfg.market,
            cfg.min_ke_g_spread,
            fcfe_0,
            beta,
        );
        let assumptions = cfg
            .call_policy
            .dcf(self.provider.as_ref(), &request)
            .await
            .map_err(|e| ValuationError::provider(AssumptionKind::Dcf, e))?;

        rules::growth_rates_bounded(
            &assumptions.growth_rates,
            cfg.growth_lower_bound,
            cfg.growth_upper_bound,
        )?;
        rules::perpetual_growth_bounded(
            assumptions.perpetual_growth_rate,
            cfg.growth_lower_bound,
            cfg.growth_upper_bound,
        )?;
        let ke = assumptions.cost_of_equity(beta);
        rules::cost_of_equity_positive(ke)?;
        rules::cost_of_equity_exceeds_growth(
            ke,
            assumptions.perpetual_growth_rate,
            cfg.min_ke_g_spread,
        )?;

        let valuation = dcf::calculate(fcfe_0, beta, shares, &assumptions)?;
        debug!(
            ticker = %snapshot.ticker,
            cost_of_equity = ke,
            equity_value = valuation.equity_value,
            fair_value = valuation.fair_value_per_share,
            "DCF computed"
        );
        rules::dcf_fair_value_non_negative(valuation.fair_value_per_share)?;

        Ok(MethodOutcome {
            fair_value_per_share: valuation.fair_value_per_share,
            assumptions: Assumptions::Dcf(assumptions),
            trace: valuation.trace,
        })
    }

    async fn attempt_multiples(
        &self,
        snapshot: &FinancialSnapshot,
    ) -> Result<MethodOutcome, ValuationError> {
        let available = |v: Option<f64>| v.is_some_and(f64::is_finite);
        if !available(snapshot.trailing_pe) && !available(snapshot.forward_pe) {
            return Err(ValuationError::calculation(
                "no trailing or forward P/E available for multiples valuation",
            ));
        }
        if !available(snapshot.trailing_eps) && !available(snapshot.forward_eps) {
            return Err(ValuationError::calculation(
                "no trailing or forward EPS available for multiples valuation",
            ));
        }

        let request = AssumptionRequest::multiples(self.summary(snapshot), self.config.market);
        let assumptions = self
            .config
            .call_policy
            .multiples(self.provider.as_ref(), &request)
            .await
            .map_err(|e| ValuationError::provider(AssumptionKind::Multiples, e))?;

        let valuation = multiples::calculate(&assumptions)?;
        Ok(MethodOutcome {
            fair_value_per_share: valuation.fair_value_per_share,
            assumptions: Assumptions::Multiples(assumptions),
            trace: valuation.trace,
        })
    }
}

fn check_preconditions(snapshot: &FinancialSnapshot) -> Result<(), ValuationError> {
    if snapshot.statements.is_empty() {
        return Err(ValuationError::DataInsufficient(format!(
            "{} has no annual statements",
            snapshot.ticker
        )));
    }
    if !snapshot.years_ordered() {
        return Err(ValuationError::DataInsufficient(format!(
            "{} statements are not ordered oldest to newest",
            snapshot.ticker
        )));
    }
    match snapshot.diluted_shares_outstanding {
        Some(shares) if shares.is_finite() && shares > 0.0 => Ok(()),
        other => Err(ValuationError::DataInsufficient(format!(
            "{} needs a positive diluted share count, got {}",
            snapshot.ticker,
            other.map_or_else(|| "none".to_string(), |s| s.to_string())
        ))),
    }
}

/// Fold earlier method failures into the error that ends the chain.
fn terminal_error(
    method: ValuationMethod,
    err: ValuationError,
    failures: &[(ValuationMethod, ValuationError)],
) -> ValuationError {
    let mut chain: Vec<String> = failures
        .iter()
        .map(|(m, e)| format!("{m}: {e}"))
        .collect();
    match err {
        ValuationError::DataInsufficient(_) if failures.is_empty() => err,
        ValuationError::Calculation {
            reason,
            chain: inner,
        } => {
            chain.extend(inner);
            ValuationError::Calculation {
                reason: format!("{method}: {reason}"),
                chain,
            }
        }
        other => ValuationError::Calculation {
            reason: format!("{method}: {other}"),
            chain,
        },
    }
}
