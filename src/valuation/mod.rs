//! Method selection, validation and the numeric core.

pub mod dcf;
mod engine;
mod error;
pub mod multiples;
pub mod rules;

pub use engine::{EngineConfig, ValuationEngine, MAX_HORIZON_YEARS, METHOD_CHAIN};
pub use error::{ValuationError, PROVIDER_UNAVAILABLE};
pub use rules::RuleViolation;
