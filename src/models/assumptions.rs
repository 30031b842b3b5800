use serde::{Deserialize, Serialize};

use super::FinancialSnapshot;

/// Which set of assumptions is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionKind {
    Dcf,
    Multiples,
}

impl AssumptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dcf => "dcf",
            Self::Multiples => "multiples",
        }
    }
}

impl std::fmt::Display for AssumptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market-wide inputs to the cost of equity, in decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketInputs {
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
}

/// One row of recent history handed to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRow {
    pub fiscal_year: i32,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub capital_expenditure: Option<f64>,
}

/// Condensed view of a snapshot used as provider context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub ticker: String,
    pub display_name: String,
    pub sector: Option<String>,
    pub currency: String,
    pub share_price: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    /// Newest first.
    pub trend: Vec<TrendRow>,
    pub headlines: Vec<String>,
}

impl SnapshotSummary {
    pub const TREND_YEARS: usize = 3;
    pub const MAX_HEADLINES: usize = 3;

    pub fn from_snapshot(snapshot: &FinancialSnapshot) -> Self {
        let trend = snapshot
            .statements
            .iter()
            .rev()
            .take(Self::TREND_YEARS)
            .map(|s| TrendRow {
                fiscal_year: s.fiscal_year,
                revenue: s.revenue,
                net_income: s.net_income,
                capital_expenditure: s.capital_expenditure.map(|c| c.value().abs()),
            })
            .collect();

        let headlines = snapshot
            .headlines
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .take(Self::MAX_HEADLINES)
            .map(str::to_string)
            .collect();

        Self {
            ticker: snapshot.ticker.clone(),
            display_name: snapshot.display_name(),
            sector: snapshot.sector.clone(),
            currency: snapshot.currency.clone(),
            share_price: snapshot.share_price,
            trailing_eps: snapshot.trailing_eps,
            forward_eps: snapshot.forward_eps,
            trailing_pe: snapshot.trailing_pe,
            forward_pe: snapshot.forward_pe,
            trend,
            headlines,
        }
    }
}

/// Context passed to an assumption provider for a single attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionRequest {
    pub kind: AssumptionKind,
    pub summary: SnapshotSummary,
    /// Number of explicit projection years (DCF only; zero for multiples).
    pub horizon_years: usize,
    pub market: MarketInputs,
    pub min_ke_g_spread: f64,
    pub base_fcfe: Option<f64>,
    pub beta: Option<f64>,
}

impl AssumptionRequest {
    pub fn dcf(
        summary: SnapshotSummary,
        horizon_years: usize,
        market: MarketInputs,
        min_ke_g_spread: f64,
        base_fcfe: f64,
        beta: f64,
    ) -> Self {
        Self {
            kind: AssumptionKind::Dcf,
            summary,
            horizon_years,
            market,
            min_ke_g_spread,
            base_fcfe: Some(base_fcfe),
            beta: Some(beta),
        }
    }

    pub fn multiples(summary: SnapshotSummary, market: MarketInputs) -> Self {
        Self {
            kind: AssumptionKind::Multiples,
            summary,
            horizon_years: 0,
            market,
            min_ke_g_spread: 0.0,
            base_fcfe: None,
            beta: None,
        }
    }

    /// Cost of equity implied by the configured market inputs and beta.
    pub fn cost_of_equity_hint(&self) -> Option<f64> {
        self.beta
            .map(|beta| self.market.risk_free_rate + beta * self.market.equity_risk_premium)
    }
}

/// Two-stage DCF assumptions. All rates are decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    /// Stage-1 FCFE growth, one entry per projection year.
    pub growth_rates: Vec<f64>,
    pub perpetual_growth_rate: f64,
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
    pub justification: String,
}

impl DcfAssumptions {
    pub fn cost_of_equity(&self, beta: f64) -> f64 {
        self.risk_free_rate + beta * self.equity_risk_premium
    }
}

/// P/E multiples assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplesAssumptions {
    pub pe_multiple: f64,
    /// e.g. "forward" or "trailing".
    pub pe_basis: String,
    pub eps_base: f64,
    pub eps_basis: String,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assumptions {
    Dcf(DcfAssumptions),
    Multiples(MultiplesAssumptions),
}

impl Assumptions {
    pub fn kind(&self) -> AssumptionKind {
        match self {
            Self::Dcf(_) => AssumptionKind::Dcf,
            Self::Multiples(_) => AssumptionKind::Multiples,
        }
    }
}
