use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::FamilyStatus;

/// Reduction of the taxable base granted for family situation.
///
/// `per_dependent[i]` is the increment for the `(i + 1)`-th dependent.
/// Dependents beyond the end of the table earn nothing further, which is how
/// the legal cap on counted children is expressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDeductionTable {
    #[serde(default)]
    pub head_of_household: Decimal,
    #[serde(default)]
    pub per_dependent: Vec<Decimal>,
}

impl FamilyDeductionTable {
    /// Flat increment for every dependent up to `max_dependents`.
    pub fn capped(
        head_of_household: Decimal,
        per_dependent: Decimal,
        max_dependents: usize,
    ) -> Self {
        Self {
            head_of_household,
            per_dependent: vec![per_dependent; max_dependents],
        }
    }

    /// Total deduction for the given family status.
    pub fn deduction_for(
        &self,
        status: &FamilyStatus,
    ) -> Decimal {
        let head = if status.is_head_of_household {
            self.head_of_household
        } else {
            Decimal::ZERO
        };

        let requested = usize::try_from(status.dependents).unwrap_or(usize::MAX);
        let counted = requested.min(self.per_dependent.len());
        if counted < requested {
            debug!(
                requested,
                counted, "dependents beyond the deduction table are not counted"
            );
        }

        head + self.per_dependent[..counted].iter().sum::<Decimal>()
    }
}
