//! Salary calculations: the gross-to-net model and its inverse.
//!
//! The free functions in this module are the boundary used by callers that
//! hold raw inputs. They validate the family status, thread the
//! configuration snapshot through explicitly and report every failure as a
//! [`PayrollError`].

pub mod common;
pub mod gross_salary;
pub mod net_salary;

pub use gross_salary::{GrossSalarySolver, NumericalError, SolverSettings};
pub use net_salary::NetSalaryCalculator;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ConfigError, FamilyStatus, PayrollConfig, SalaryBreakdown, ValidationError};

/// Any failure of a payroll computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayrollError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("numerical failure: {0}")]
    Numerical(#[from] NumericalError),
}

/// Computes the quantized gross-to-net breakdown.
///
/// # Errors
///
/// Returns [`PayrollError::Validation`] for a negative dependents count.
pub fn compute_net(
    gross: Decimal,
    is_head_of_household: bool,
    dependents: i64,
    config: &PayrollConfig,
) -> Result<SalaryBreakdown, PayrollError> {
    let status = FamilyStatus::new(is_head_of_household, dependents)?;
    Ok(NetSalaryCalculator::new(config).calculate(gross, &status))
}

/// Computes the gross salary that pays `net_target`, rounded to the minor
/// currency unit. A target of zero or less yields zero.
///
/// # Errors
///
/// Returns [`PayrollError::Validation`] for a negative dependents count and
/// [`PayrollError::Numerical`] when the solver cannot reach the target.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
/// use payroll_core::calculations::compute_gross_from_net;
/// use payroll_core::{PayrollConfig, RawPayrollConfig, TaxBracket};
///
/// let config = PayrollConfig::validate(RawPayrollConfig {
///     version: "2024".to_string(),
///     effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     contribution_rate: dec!(0.0968),
///     contribution_ceiling: None,
///     brackets: vec![
///         TaxBracket::bounded(dec!(200), dec!(0)),
///         TaxBracket::bounded(dec!(500), dec!(0.15)),
///         TaxBracket::bounded(dec!(1000), dec!(0.25)),
///         TaxBracket::unbounded(dec!(0.30)),
///     ],
///     family_deduction: Default::default(),
/// })
/// .unwrap();
///
/// let gross = compute_gross_from_net(dec!(757.400), false, 0, &config).unwrap();
///
/// assert_eq!(gross, dec!(1000.000));
/// ```
pub fn compute_gross_from_net(
    net_target: Decimal,
    is_head_of_household: bool,
    dependents: i64,
    config: &PayrollConfig,
) -> Result<Decimal, PayrollError> {
    let status = FamilyStatus::new(is_head_of_household, dependents)?;
    solve_gross(net_target, &status, config, SolverSettings::default())
}

/// Like [`compute_gross_from_net`], also returning the forward breakdown of
/// the solved gross for display or verification.
///
/// # Errors
///
/// Same as [`compute_gross_from_net`].
pub fn compute_gross_breakdown_from_net(
    net_target: Decimal,
    is_head_of_household: bool,
    dependents: i64,
    config: &PayrollConfig,
) -> Result<SalaryBreakdown, PayrollError> {
    let status = FamilyStatus::new(is_head_of_household, dependents)?;
    let gross = solve_gross(net_target, &status, config, SolverSettings::default())?;
    Ok(NetSalaryCalculator::new(config).calculate(gross, &status))
}

/// Solves for gross with explicit solver settings.
///
/// # Errors
///
/// Returns [`PayrollError::Validation`] for invalid settings and
/// [`PayrollError::Numerical`] when the solver fails.
pub fn solve_gross(
    net_target: Decimal,
    status: &FamilyStatus,
    config: &PayrollConfig,
    settings: SolverSettings,
) -> Result<Decimal, PayrollError> {
    settings.validate()?;
    let solver = GrossSalarySolver::with_settings(NetSalaryCalculator::new(config), settings);
    Ok(solver.solve(net_target, status)?)
}
