use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One slice of the progressive tax schedule.
///
/// A bracket covers the taxable base between the previous bracket's
/// `upper_bound` (or zero for the first bracket) and its own `upper_bound`.
/// `None` marks the open-ended top bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn bounded(
        upper_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }
}
