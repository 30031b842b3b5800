use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Marker for a statement field that does not apply to the company.
///
/// Serialized as the string `"not_applicable"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotApplicable {
    NotApplicable,
}

/// A cash-flow adjustment on an annual statement.
///
/// Absent fields are `None` on the statement; a field the company genuinely
/// does not have (no debt, no capex) is `NotApplicable` and counts as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineItem {
    Reported(f64),
    NotApplicable(NotApplicable),
}

impl LineItem {
    pub fn not_applicable() -> Self {
        Self::NotApplicable(NotApplicable::NotApplicable)
    }

    /// Numeric value with not-applicable fields zero-filled.
    pub fn value(&self) -> f64 {
        match self {
            Self::Reported(v) => *v,
            Self::NotApplicable(_) => 0.0,
        }
    }
}

impl From<f64> for LineItem {
    fn from(value: f64) -> Self {
        Self::Reported(value)
    }
}

/// One fiscal year of statement data.
///
/// Sign conventions:
/// - `depreciation_amortization` and `capital_expenditure` are magnitudes;
///   their sign is ignored, so a cash-flow-statement capex of `-1200` and a
///   capex of `1200` both mean 1200 was spent.
/// - `change_in_working_capital` is the *increase* in non-cash working
///   capital. Positive consumes cash, negative releases it.
/// - `net_borrowing` is debt issued minus debt repaid. Positive adds cash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualStatement {
    pub fiscal_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation_amortization: Option<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_expenditure: Option<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_in_working_capital: Option<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_borrowing: Option<LineItem>,
}

impl AnnualStatement {
    pub fn new(fiscal_year: i32) -> Self {
        Self {
            fiscal_year,
            revenue: None,
            net_income: None,
            depreciation_amortization: None,
            capital_expenditure: None,
            change_in_working_capital: None,
            net_borrowing: None,
        }
    }
}

/// Normalized financial data for one ticker, as supplied by the caller.
///
/// Statements are ordered oldest to newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub statements: Vec<AnnualStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diluted_shares_outstanding: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_eps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_eps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_pe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_pe: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headlines: Vec<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl FinancialSnapshot {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into().trim().to_uppercase(),
            company_name: None,
            sector: None,
            currency: default_currency(),
            as_of: None,
            statements: Vec::new(),
            share_price: None,
            diluted_shares_outstanding: None,
            beta: None,
            trailing_eps: None,
            forward_eps: None,
            trailing_pe: None,
            forward_pe: None,
            headlines: Vec::new(),
        }
    }

    /// Parse a snapshot and normalize it the same way [`FinancialSnapshot::new`] does.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Self>(json).map(Self::normalized)
    }

    /// Trim and upper-case the ticker.
    pub fn normalized(mut self) -> Self {
        self.ticker = self.ticker.trim().to_uppercase();
        self
    }

    /// The newest annual statement, the base year for FCFE.
    pub fn latest_statement(&self) -> Option<&AnnualStatement> {
        self.statements.last()
    }

    /// Whether fiscal years strictly increase from first to last.
    pub fn years_ordered(&self) -> bool {
        self.statements
            .windows(2)
            .all(|pair| pair[0].fiscal_year < pair[1].fiscal_year)
    }

    /// "Company Name (TICK)" when a name is known, otherwise the ticker.
    pub fn display_name(&self) -> String {
        match self.company_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{name} ({})", self.ticker),
            _ => self.ticker.clone(),
        }
    }
}
