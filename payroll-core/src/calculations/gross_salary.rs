//! Net-to-gross salary solver.
//!
//! The forward model has no convenient closed-form inverse once brackets,
//! ceilings and deductions interact, so the gross is recovered numerically
//! with [`NetSalaryCalculator`] as the only oracle:
//!
//! 1. A target of zero or less maps to a gross of zero.
//! 2. Starting from `lo = hi = target` (gross is never below net), `hi` is
//!    doubled until its net reaches the target. Each failed `hi` becomes the
//!    new `lo`.
//! 3. The interval is bisected until it is narrower than the tolerance. The
//!    oracle is the net before the tax is rounded, which keeps the search
//!    free of rounding plateaus.
//! 4. The upper end is rounded to the minor currency unit and snapped to
//!    the grid gross whose reported net matches the target (see
//!    [`GrossSalarySolver::solve`]).
//!
//! Both loops are capped, so every call terminates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::calculations::NetSalaryCalculator;
use crate::calculations::common::{minor_unit, round_half_up};
use crate::{FamilyStatus, ValidationError};

/// The solver could not produce a gross salary.
///
/// Only reachable with a configuration whose effective marginal rate reaches
/// 100%, or through an implementation bug.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NumericalError {
    #[error("net target {net_target} not reached after {doublings} doublings of the gross")]
    BracketNotFound { net_target: Decimal, doublings: u32 },

    #[error("bisection did not converge after {iterations} iterations (interval {lower}..{upper})")]
    NotConverged {
        iterations: u32,
        lower: Decimal,
        upper: Decimal,
    },
}

/// Termination parameters for [`GrossSalarySolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Bisection stops once the interval is narrower than this.
    pub tolerance: Decimal,

    /// Maximum number of times the upper bound may be doubled.
    pub max_doublings: u32,

    /// Maximum number of bisection steps.
    pub max_iterations: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            // 0.0001, a tenth of the minor unit
            tolerance: Decimal::new(1, 4),
            max_doublings: 60,
            max_iterations: 200,
        }
    }
}

impl SolverSettings {
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a non-positive tolerance or a zero
    /// iteration limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tolerance <= Decimal::ZERO {
            return Err(ValidationError::InvalidTolerance(self.tolerance));
        }
        if self.max_iterations == 0 {
            return Err(ValidationError::InvalidIterationLimit);
        }
        Ok(())
    }
}

/// Grid points on each side of the bisection result searched when snapping.
const SNAP_WINDOW: i64 = 4;

/// Finds the gross salary that yields a target net salary.
#[derive(Debug, Clone, Copy)]
pub struct GrossSalarySolver<'a> {
    calculator: NetSalaryCalculator<'a>,
    settings: SolverSettings,
}

impl<'a> GrossSalarySolver<'a> {
    pub fn new(calculator: NetSalaryCalculator<'a>) -> Self {
        Self::with_settings(calculator, SolverSettings::default())
    }

    pub fn with_settings(
        calculator: NetSalaryCalculator<'a>,
        settings: SolverSettings,
    ) -> Self {
        Self {
            calculator,
            settings,
        }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solves for the gross salary, rounded to the minor currency unit.
    ///
    /// Feeding the result back through the calculator yields a net within one
    /// minor unit of `net_target`, and exactly `net_target` when it is a
    /// whole number of minor units. Solving the reported net of a gross
    /// returns that gross to within one minor unit.
    ///
    /// # Errors
    ///
    /// Returns [`NumericalError`] when the target cannot be bracketed or the
    /// bisection exceeds its iteration cap.
    pub fn solve(
        &self,
        net_target: Decimal,
        status: &FamilyStatus,
    ) -> Result<Decimal, NumericalError> {
        if net_target <= Decimal::ZERO {
            return Ok(round_half_up(Decimal::ZERO));
        }

        let (mut lower, mut upper) = self.bracket_target(net_target, status)?;

        let mut iterations = 0;
        while upper - lower >= self.settings.tolerance {
            if iterations >= self.settings.max_iterations {
                error!(
                    config = self.calculator.config().version(),
                    %net_target,
                    %lower,
                    %upper,
                    iterations,
                    "gross solver did not converge"
                );
                return Err(NumericalError::NotConverged {
                    iterations,
                    lower,
                    upper,
                });
            }
            iterations += 1;

            // `lower + upper` can overflow near Decimal::MAX
            let mid = lower + (upper - lower) / Decimal::TWO;
            if self.calculator.unrounded_net(mid, status) < net_target {
                lower = mid;
            } else {
                upper = mid;
            }
        }

        let gross = self.snap_to_grid(upper, net_target, status);
        debug!(
            config = self.calculator.config().version(),
            %net_target,
            %gross,
            iterations,
            "solved gross salary"
        );
        Ok(gross)
    }

    /// Moves the bisection result onto the minor-unit grid.
    ///
    /// The contribution is rounded, so the reported net moves by -1, 0 or +1
    /// minor unit per minor unit of gross and up to three neighbouring
    /// grosses report the same net. The middle of that run is returned.
    /// Targets between grid values get the first gross whose reported net
    /// reaches them.
    fn snap_to_grid(
        &self,
        approx: Decimal,
        net_target: Decimal,
        status: &FamilyStatus,
    ) -> Decimal {
        let step = minor_unit();
        let center = round_half_up(approx);
        let candidates: Vec<Decimal> = (-SNAP_WINDOW..=SNAP_WINDOW)
            .filter_map(|offset| center.checked_add(step * Decimal::from(offset)))
            .filter(|gross| *gross >= Decimal::ZERO)
            .collect();
        let reported_net = |gross: Decimal| self.calculator.calculate(gross, status).net;

        let mut matches = candidates
            .iter()
            .copied()
            .filter(|gross| reported_net(*gross) == net_target);
        if let Some(first) = matches.next() {
            let last = matches.last().unwrap_or(first);
            return if last - first >= step * Decimal::TWO {
                first + step
            } else {
                first
            };
        }

        candidates
            .into_iter()
            .find(|gross| reported_net(*gross) >= net_target)
            .unwrap_or(center)
    }

    /// Returns `(lower, upper)` with `net(upper) >= target`; `net(lower) <
    /// target` holds whenever the interval is non-empty.
    fn bracket_target(
        &self,
        net_target: Decimal,
        status: &FamilyStatus,
    ) -> Result<(Decimal, Decimal), NumericalError> {
        let mut lower = net_target;
        let mut upper = net_target;
        let mut doublings = 0;

        while self.calculator.unrounded_net(upper, status) < net_target {
            let doubled = upper.checked_mul(Decimal::TWO);
            let Some(doubled) = doubled.filter(|_| doublings < self.settings.max_doublings)
            else {
                error!(
                    config = self.calculator.config().version(),
                    %net_target,
                    doublings,
                    "net target cannot be reached with this configuration"
                );
                return Err(NumericalError::BracketNotFound {
                    net_target,
                    doublings,
                });
            };
            lower = upper;
            upper = doubled;
            doublings += 1;
        }

        Ok((lower, upper))
    }
}
