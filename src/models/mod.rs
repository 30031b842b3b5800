mod assumptions;
mod result;
mod snapshot;

pub use assumptions::{
    AssumptionKind, AssumptionRequest, Assumptions, DcfAssumptions, MarketInputs,
    MultiplesAssumptions, SnapshotSummary, TrendRow,
};
pub use result::{FallbackReason, Trace, TraceStep, ValuationMethod, ValuationResult};
pub use snapshot::{AnnualStatement, FinancialSnapshot, LineItem, NotApplicable};
