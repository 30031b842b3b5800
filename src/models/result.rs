use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Assumptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    Dcf,
    Multiples,
}

impl ValuationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dcf => "dcf",
            Self::Multiples => "multiples",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dcf => "Two-stage FCFE discounted cash flow",
            Self::Multiples => "P/E multiples",
        }
    }
}

impl std::fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub label: String,
    pub value: f64,
}

/// Ordered record of every intermediate figure behind a fair value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace(Vec<TraceStep>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step and hand the value back so arithmetic can continue inline.
    pub fn record(&mut self, label: impl Into<String>, value: f64) -> f64 {
        self.0.push(TraceStep {
            label: label.into(),
            value,
        });
        value
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.0
    }

    /// First value recorded under `label`.
    pub fn value(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|s| s.label == label).map(|s| s.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why the DCF attempt was abandoned in favour of the fallback method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackReason {
    /// Name of the rejecting validation rule, or `provider_unavailable`.
    pub rule: String,
    pub detail: String,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.detail)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub ticker: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    pub method: ValuationMethod,
    pub fair_value_per_share: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_price: Option<f64>,
    pub assumptions: Assumptions,
    pub trace: Trace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl ValuationResult {
    /// (FVE - price) / price, when a positive price is known.
    pub fn upside(&self) -> Option<f64> {
        match self.share_price {
            Some(price) if price > 0.0 && price.is_finite() => {
                Some((self.fair_value_per_share - price) / price)
            }
            _ => None,
        }
    }
}
