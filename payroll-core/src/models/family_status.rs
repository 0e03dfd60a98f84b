use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid caller input. Surfaced directly, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dependents must be non-negative, got {0}")]
    NegativeDependents(i64),

    #[error("dependents count {0} is out of range")]
    TooManyDependents(i64),

    #[error("gross salary must be non-negative, got {0}")]
    NegativeGross(Decimal),

    #[error("solver tolerance must be positive, got {0}")]
    InvalidTolerance(Decimal),

    #[error("solver iteration limit must be positive")]
    InvalidIterationLimit,
}

/// Family situation of an employee, as captured on the salary record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyStatus {
    pub is_head_of_household: bool,
    pub dependents: u32,
}

impl FamilyStatus {
    /// Builds a family status from unchecked caller input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeDependents`] for a negative count and
    /// [`ValidationError::TooManyDependents`] when it does not fit in `u32`.
    pub fn new(
        is_head_of_household: bool,
        dependents: i64,
    ) -> Result<Self, ValidationError> {
        if dependents < 0 {
            return Err(ValidationError::NegativeDependents(dependents));
        }
        let dependents = u32::try_from(dependents)
            .map_err(|_| ValidationError::TooManyDependents(dependents))?;

        Ok(Self {
            is_head_of_household,
            dependents,
        })
    }
}
