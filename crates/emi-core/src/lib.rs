pub mod amortization;
pub mod error;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "presentation")]
pub mod presentation;

pub use amortization::{compute_amortization, AmortizationResult, LoanQuote, LoanSummary};
pub use error::{EmiError, Violation};
pub use types::*;

/// Standard result type for all EMI operations
pub type EmiResult<T> = Result<T, EmiError>;
