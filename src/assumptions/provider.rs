use std::time::Duration;

use crate::models::{AssumptionRequest, Assumptions};

/// Ways an assumption provider call can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("malformed reply: {0}")]
    Malformed(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Network and server failures may succeed on a second attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server(_))
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Source of forward-looking valuation assumptions.
///
/// Implementations are treated as untrusted: whatever they return is checked
/// again before any number reaches a calculator.
#[async_trait::async_trait]
pub trait AssumptionProvider: Send + Sync {
    async fn assumptions(&self, request: &AssumptionRequest) -> Result<Assumptions, ProviderError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_server_errors_are_transient() {
        assert!(ProviderError::Transport("reset".into()).is_transient());
        assert!(ProviderError::Server("503".into()).is_transient());
        assert!(!ProviderError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!ProviderError::malformed("no json").is_transient());
        assert!(!ProviderError::Unavailable("no key".into()).is_transient());
    }
}
