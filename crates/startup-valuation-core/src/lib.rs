pub mod error;
pub mod report;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "venture")]
pub mod venture;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::ValuationError;
pub use types::*;

/// Standard result type for all valuation operations
pub type ValuationResult<T> = Result<T, ValuationError>;
