#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fairvalue::assumptions::{AssumptionProvider, CallPolicy, ProviderError};
use fairvalue::models::{
    AnnualStatement, AssumptionKind, AssumptionRequest, Assumptions, DcfAssumptions,
    FinancialSnapshot, LineItem, MarketInputs, MultiplesAssumptions,
};
use fairvalue::valuation::EngineConfig;

/// Scripted provider keyed by assumption kind.
#[derive(Default)]
pub struct MockAssumptionProvider {
    dcf: Option<DcfAssumptions>,
    multiples: Option<MultiplesAssumptions>,
    failures: HashMap<AssumptionKind, ProviderError>,
    transient: Mutex<HashMap<AssumptionKind, usize>>,
    delays: HashMap<AssumptionKind, Duration>,
    dcf_calls: AtomicUsize,
    multiples_calls: AtomicUsize,
    requests: Mutex<Vec<AssumptionRequest>>,
}

impl MockAssumptionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dcf(mut self, assumptions: DcfAssumptions) -> Self {
        self.dcf = Some(assumptions);
        self
    }

    pub fn with_multiples(mut self, assumptions: MultiplesAssumptions) -> Self {
        self.multiples = Some(assumptions);
        self
    }

    /// Every call for `kind` fails with `error`.
    pub fn fail_on(mut self, kind: AssumptionKind, error: ProviderError) -> Self {
        self.failures.insert(kind, error);
        self
    }

    /// The first `times` calls for `kind` fail with a server error.
    pub fn fail_transiently(self, kind: AssumptionKind, times: usize) -> Self {
        self.transient
            .lock()
            .expect("transient lock")
            .insert(kind, times);
        self
    }

    pub fn with_delay(mut self, kind: AssumptionKind, delay: Duration) -> Self {
        self.delays.insert(kind, delay);
        self
    }

    pub fn calls(&self, kind: AssumptionKind) -> usize {
        match kind {
            AssumptionKind::Dcf => self.dcf_calls.load(Ordering::SeqCst),
            AssumptionKind::Multiples => self.multiples_calls.load(Ordering::SeqCst),
        }
    }

    pub fn requests(&self) -> Vec<AssumptionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl AssumptionProvider for MockAssumptionProvider {
    async fn assumptions(&self, request: &AssumptionRequest) -> Result<Assumptions, ProviderError> {
        match request.kind {
            AssumptionKind::Dcf => self.dcf_calls.fetch_add(1, Ordering::SeqCst),
            AssumptionKind::Multiples => self.multiples_calls.fetch_add(1, Ordering::SeqCst),
        };
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        if let Some(delay) = self.delays.get(&request.kind) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = self.failures.get(&request.kind) {
            return Err(err.clone());
        }
        {
            let mut transient = self.transient.lock().expect("transient lock");
            if let Some(remaining) = transient.get_mut(&request.kind) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ProviderError::Server("HTTP 503".to_string()));
                }
            }
        }

        let assumptions = match request.kind {
            AssumptionKind::Dcf => self.dcf.clone().map(Assumptions::Dcf),
            AssumptionKind::Multiples => self.multiples.clone().map(Assumptions::Multiples),
        };
        assumptions.ok_or_else(|| ProviderError::Unavailable(format!("no {} script", request.kind)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A company whose base-year FCFE is exactly 100.
pub fn scenario_snapshot() -> FinancialSnapshot {
    let mut snapshot = FinancialSnapshot::new("ACME");
    snapshot.company_name = Some("Acme Corp".to_string());
    snapshot.sector = Some("Industrials".to_string());
    snapshot.statements = vec![
        AnnualStatement {
            revenue: Some(900.0),
            net_income: Some(90.0),
            depreciation_amortization: Some(LineItem::Reported(18.0)),
            capital_expenditure: Some(LineItem::Reported(-18.0)),
            change_in_working_capital: Some(LineItem::not_applicable()),
            net_borrowing: Some(LineItem::not_applicable()),
            ..AnnualStatement::new(2023)
        },
        AnnualStatement {
            revenue: Some(1000.0),
            net_income: Some(100.0),
            depreciation_amortization: Some(LineItem::Reported(20.0)),
            capital_expenditure: Some(LineItem::Reported(-25.0)),
            change_in_working_capital: Some(LineItem::Reported(5.0)),
            net_borrowing: Some(LineItem::Reported(10.0)),
            ..AnnualStatement::new(2024)
        },
    ];
    snapshot.share_price = Some(28.0);
    snapshot.diluted_shares_outstanding = Some(50.0);
    snapshot.beta = Some(1.2);
    snapshot.trailing_eps = Some(2.0);
    snapshot.forward_eps = Some(2.2);
    snapshot.trailing_pe = Some(14.0);
    snapshot.forward_pe = Some(12.7);
    snapshot
}

pub fn scenario_dcf(perpetual_growth_rate: f64) -> DcfAssumptions {
    DcfAssumptions {
        growth_rates: vec![0.10, 0.08, 0.06],
        perpetual_growth_rate,
        risk_free_rate: 0.04,
        equity_risk_premium: 0.05,
        justification: "steady normalization".to_string(),
    }
}

pub fn multiples(pe: f64, eps: f64) -> MultiplesAssumptions {
    MultiplesAssumptions {
        pe_multiple: pe,
        pe_basis: "trailing".to_string(),
        eps_base: eps,
        eps_basis: "trailing".to_string(),
        justification: "sector median".to_string(),
    }
}

pub fn engine_config() -> EngineConfig {
    EngineConfig {
        horizon_years: 3,
        min_ke_g_spread: 0.01,
        growth_lower_bound: -0.5,
        growth_upper_bound: 1.0,
        market: MarketInputs {
            risk_free_rate: 0.04,
            equity_risk_premium: 0.05,
        },
        call_policy: CallPolicy::new(Duration::from_secs(5), 1),
    }
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} (+/- {tolerance}), got {actual}"
    );
}
