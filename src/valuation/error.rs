use crate::assumptions::ProviderError;
use crate::models::{AssumptionKind, FallbackReason};

use super::rules::RuleViolation;

/// Rule name recorded when DCF was abandoned because the provider failed.
pub const PROVIDER_UNAVAILABLE: &str = "provider_unavailable";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValuationError {
    /// The snapshot cannot support any valuation.
    #[error("insufficient data: {0}")]
    DataInsufficient(String),

    /// Engine settings that no valuation can run under.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The provider failed or returned structurally invalid assumptions.
    #[error("assumption provider failed for {kind} assumptions: {source}")]
    AssumptionProvider {
        kind: AssumptionKind,
        #[source]
        source: ProviderError,
    },

    #[error("validation failed: {0}")]
    ValidationFailure(#[from] RuleViolation),

    /// No method produced a value. `chain` lists every earlier failure, oldest first.
    #[error("calculation failed: {reason}")]
    Calculation { reason: String, chain: Vec<String> },
}

impl ValuationError {
    pub fn calculation(reason: impl Into<String>) -> Self {
        Self::Calculation {
            reason: reason.into(),
            chain: Vec::new(),
        }
    }

    pub fn provider(kind: AssumptionKind, source: ProviderError) -> Self {
        Self::AssumptionProvider { kind, source }
    }

    /// Whether a later method in the chain may still succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AssumptionProvider { .. } | Self::ValidationFailure(_)
        )
    }

    /// How this failure is recorded on a result produced by a later method.
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            Self::ValidationFailure(v) => FallbackReason {
                rule: v.rule.to_string(),
                detail: v.reason.clone(),
            },
            Self::AssumptionProvider { source, .. } => FallbackReason {
                rule: PROVIDER_UNAVAILABLE.to_string(),
                detail: source.to_string(),
            },
            Self::DataInsufficient(detail) => FallbackReason {
                rule: "data_insufficient".to_string(),
                detail: detail.clone(),
            },
            Self::InvalidConfig(detail) => FallbackReason {
                rule: "invalid_config".to_string(),
                detail: detail.clone(),
            },
            Self::Calculation { reason, .. } => FallbackReason {
                rule: "calculation".to_string(),
                detail: reason.clone(),
            },
        }
    }

    /// Every failure message behind this error, oldest first, ending with this one.
    pub fn reason_chain(&self) -> Vec<String> {
        match self {
            Self::Calculation { reason, chain } => {
                let mut all = chain.clone();
                all.push(reason.clone());
                all
            }
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::rules;

    #[test]
    fn validation_failure_maps_to_rule_name() {
        let err: ValuationError = rules::beta_present_and_finite(None).unwrap_err().into();
        assert!(err.is_recoverable());
        let reason = err.fallback_reason();
        assert_eq!(reason.rule, rules::BETA_PRESENT_AND_FINITE);
        assert_eq!(reason.detail, "beta is not available");
    }

    #[test]
    fn provider_failure_maps_to_provider_unavailable() {
        let err = ValuationError::provider(
            AssumptionKind::Dcf,
            ProviderError::Server("HTTP 503".to_string()),
        );
        assert!(err.is_recoverable());
        assert_eq!(err.fallback_reason().rule, PROVIDER_UNAVAILABLE);
        assert!(err.to_string().contains("dcf assumptions"));
    }

    #[test]
    fn calculation_chain_ends_with_reason() {
        let err = ValuationError::Calculation {
            reason: "EPS base must be positive".to_string(),
            chain: vec!["dcf: beta_present_and_finite: beta is not available".to_string()],
        };
        assert!(!err.is_recoverable());
        assert_eq!(
            err.reason_chain(),
            vec![
                "dcf: beta_present_and_finite: beta is not available".to_string(),
                "EPS base must be positive".to_string(),
            ]
        );
        assert!(!ValuationError::DataInsufficient("x".into()).is_recoverable());
    }
}
