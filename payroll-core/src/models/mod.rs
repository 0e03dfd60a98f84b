mod family_deduction;
mod family_status;
mod payroll_config;
mod salary_breakdown;
mod salary_record;
mod tax_bracket;

pub use family_deduction::FamilyDeductionTable;
pub use family_status::{FamilyStatus, ValidationError};
pub use payroll_config::{
    ConfigError, ConfigVersion, PayrollConfig, RawPayrollConfig, select_effective,
};
pub use salary_breakdown::SalaryBreakdown;
pub use salary_record::{NewSalaryRecord, SalaryRecord};
pub use tax_bracket::TaxBracket;
