use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FamilyStatus;

/// A persisted, effective-dated salary entry.
///
/// `config_version` pins the configuration the figures were computed with,
/// so the record can be recomputed later against the same rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRecord {
    pub id: i64,
    pub employee_id: i64,
    pub effective_date: NaiveDate,
    pub gross: Decimal,
    pub net: Decimal,
    pub is_head_of_household: bool,
    pub dependents: u32,
    pub config_version: String,
    pub created_at: DateTime<Utc>,
}

impl SalaryRecord {
    pub fn family_status(&self) -> FamilyStatus {
        FamilyStatus {
            is_head_of_household: self.is_head_of_household,
            dependents: self.dependents,
        }
    }
}

/// For creating new salary records (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSalaryRecord {
    pub employee_id: i64,
    pub effective_date: NaiveDate,
    pub gross: Decimal,
    pub net: Decimal,
    pub is_head_of_household: bool,
    pub dependents: u32,
    pub config_version: String,
}
