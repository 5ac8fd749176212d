pub mod error;
pub mod fields;
pub mod savings;
pub mod types;

#[cfg(feature = "phases")]
pub mod phases;

#[cfg(feature = "phases")]
pub mod lifecycle;

#[cfg(feature = "phases")]
pub mod cache;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub use error::PlannerError;
pub use fields::FieldMap;
pub use types::*;

/// Standard result type for all retirement-planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
