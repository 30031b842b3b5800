//! Forward-looking assumptions from external, untrusted providers.

mod guard;
pub mod parsing;
pub mod prompt;
mod provider;
pub mod providers;

pub use guard::CallPolicy;
pub use provider::{AssumptionProvider, ProviderError};
