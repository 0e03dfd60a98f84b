use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Forward computation result for one gross salary, quantized to the minor
/// currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    pub gross: Decimal,
    pub contribution: Decimal,
    pub deduction: Decimal,
    pub taxable_base: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
}

impl SalaryBreakdown {
    pub fn zero() -> Self {
        Self {
            gross: Decimal::ZERO,
            contribution: Decimal::ZERO,
            deduction: Decimal::ZERO,
            taxable_base: Decimal::ZERO,
            tax: Decimal::ZERO,
            net: Decimal::ZERO,
        }
    }
}
