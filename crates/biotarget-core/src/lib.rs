pub mod assumptions;
pub mod company;
pub mod error;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "screening")]
pub mod screening;

#[cfg(feature = "ranking")]
pub mod ranking;

#[cfg(feature = "targets")]
pub mod targets;

pub use error::BiotargetError;
pub use types::*;

/// Standard result type for all biotarget operations
pub type BiotargetResult<T> = Result<T, BiotargetError>;
