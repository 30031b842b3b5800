//! Bounded, checked calls into an [`AssumptionProvider`].

use std::time::Duration;

use tracing::{debug, warn};

use super::{AssumptionProvider, ProviderError};
use crate::models::{AssumptionRequest, Assumptions, DcfAssumptions, MultiplesAssumptions};

/// Timeout and retry policy for provider calls.
///
/// Each attempt gets its own timeout. Only transient failures are retried,
/// and never more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    timeout: Duration,
    max_retries: u32,
}

impl CallPolicy {
    pub const MAX_RETRIES: u32 = 1;

    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries: max_retries.min(Self::MAX_RETRIES),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub async fn call(
        &self,
        provider: &dyn AssumptionProvider,
        request: &AssumptionRequest,
    ) -> Result<Assumptions, ProviderError> {
        let mut attempt = 0;
        loop {
            debug!(
                provider = provider.name(),
                kind = %request.kind,
                attempt,
                "requesting assumptions"
            );
            let outcome = match tokio::time::timeout(self.timeout, provider.assumptions(request)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Timeout(self.timeout)),
            };

            match outcome {
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    warn!(
                        provider = provider.name(),
                        kind = %request.kind,
                        error = %err,
                        "assumption provider failed, retrying"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Fetch DCF assumptions and confirm their shape matches the request.
    pub async fn dcf(
        &self,
        provider: &dyn AssumptionProvider,
        request: &AssumptionRequest,
    ) -> Result<DcfAssumptions, ProviderError> {
        match self.call(provider, request).await? {
            Assumptions::Dcf(assumptions) => {
                check_dcf_structure(&assumptions, request.horizon_years)?;
                Ok(assumptions)
            }
            other => Err(ProviderError::malformed(format!(
                "expected dcf assumptions, got {}",
                other.kind()
            ))),
        }
    }

    pub async fn multiples(
        &self,
        provider: &dyn AssumptionProvider,
        request: &AssumptionRequest,
    ) -> Result<MultiplesAssumptions, ProviderError> {
        match self.call(provider, request).await? {
            Assumptions::Multiples(assumptions) => {
                check_multiples_structure(&assumptions)?;
                Ok(assumptions)
            }
            other => Err(ProviderError::malformed(format!(
                "expected multiples assumptions, got {}",
                other.kind()
            ))),
        }
    }
}

fn finite(field: &str, value: f64) -> Result<(), ProviderError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProviderError::malformed(format!("{field} is not a finite number")))
    }
}

pub(crate) fn check_dcf_structure(
    assumptions: &DcfAssumptions,
    horizon_years: usize,
) -> Result<(), ProviderError> {
    if assumptions.growth_rates.len() != horizon_years {
        return Err(ProviderError::malformed(format!(
            "expected {horizon_years} stage-1 growth rates, got {}",
            assumptions.growth_rates.len()
        )));
    }
    for (i, rate) in assumptions.growth_rates.iter().enumerate() {
        finite(&format!("growth rate for year {}", i + 1), *rate)?;
    }
    finite("perpetual growth rate", assumptions.perpetual_growth_rate)?;
    finite("risk-free rate", assumptions.risk_free_rate)?;
    finite("equity risk premium", assumptions.equity_risk_premium)
}

pub(crate) fn check_multiples_structure(
    assumptions: &MultiplesAssumptions,
) -> Result<(), ProviderError> {
    finite("P/E multiple", assumptions.pe_multiple)?;
    finite("EPS base", assumptions.eps_base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FinancialSnapshot, MarketInputs, SnapshotSummary};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedProvider {
        replies: Mutex<Vec<Result<Assumptions, ProviderError>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(mut replies: Vec<Result<Assumptions, ProviderError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl AssumptionProvider for ScriptedProvider {
        async fn assumptions(
            &self,
            _request: &AssumptionRequest,
        ) -> Result<Assumptions, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ProviderError::Unavailable("script exhausted".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn request() -> AssumptionRequest {
        let summary = SnapshotSummary::from_snapshot(&FinancialSnapshot::new("ACME"));
        let market = MarketInputs {
            risk_free_rate: 0.04,
            equity_risk_premium: 0.05,
        };
        AssumptionRequest::dcf(summary, 2, market, 0.01, 100.0, 1.0)
    }

    fn dcf(rates: Vec<f64>) -> Assumptions {
        Assumptions::Dcf(DcfAssumptions {
            growth_rates: rates,
            perpetual_growth_rate: 0.02,
            risk_free_rate: 0.04,
            equity_risk_premium: 0.05,
            justification: String::new(),
        })
    }

    #[test]
    fn retries_are_clamped_to_one() {
        assert_eq!(CallPolicy::new(Duration::from_secs(1), 5).max_retries(), 1);
        assert_eq!(CallPolicy::new(Duration::from_secs(1), 0).max_retries(), 0);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::Server("503".into())),
            Ok(dcf(vec![0.1, 0.1])),
        ]);
        let policy = CallPolicy::new(Duration::from_secs(5), 1);

        let assumptions = policy.dcf(&provider, &request()).await.unwrap();
        assert_eq!(assumptions.growth_rates, vec![0.1, 0.1]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_transient_failure_is_returned() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::Transport("reset".into())),
            Err(ProviderError::Transport("reset again".into())),
            Ok(dcf(vec![0.1, 0.1])),
        ]);
        let policy = CallPolicy::new(Duration::from_secs(5), 3);

        let err = policy.call(&provider, &request()).await.unwrap_err();
        assert_eq!(err, ProviderError::Transport("reset again".into()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_reply_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::malformed("no json"))]);
        let policy = CallPolicy::new(Duration::from_secs(5), 1);

        assert!(policy.call(&provider, &request()).await.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_not_retried() {
        let mut provider = ScriptedProvider::new(vec![Ok(dcf(vec![0.1, 0.1]))]);
        provider.delay = Some(Duration::from_secs(60));
        let policy = CallPolicy::new(Duration::from_secs(2), 1);

        let err = policy.call(&provider, &request()).await.unwrap_err();
        assert_eq!(err, ProviderError::Timeout(Duration::from_secs(2)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wrong_growth_length_is_malformed() {
        let provider = ScriptedProvider::new(vec![Ok(dcf(vec![0.1, 0.1, 0.1]))]);
        let policy = CallPolicy::new(Duration::from_secs(5), 0);

        let err = policy.dcf(&provider, &request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(ref m) if m.contains("expected 2")));
    }

    #[tokio::test]
    async fn wrong_variant_is_malformed() {
        let provider = ScriptedProvider::new(vec![Ok(dcf(vec![0.1, 0.1]))]);
        let policy = CallPolicy::new(Duration::from_secs(5), 0);

        let err = policy.multiples(&provider, &request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn non_finite_growth_is_malformed() {
        let Assumptions::Dcf(mut assumptions) = dcf(vec![0.1, f64::NAN]) else {
            unreachable!()
        };
        assert!(check_dcf_structure(&assumptions, 2).is_err());
        assumptions.growth_rates[1] = 0.05;
        assert!(check_dcf_structure(&assumptions, 2).is_ok());
    }
}
