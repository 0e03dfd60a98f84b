//! Gross-to-net salary calculation.
//!
//! # Computation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Contribution: min(gross, ceiling) × contribution rate, rounded |
//! | 2    | Family deduction for head-of-household status and dependents |
//! | 3    | Taxable base: gross − contribution − deduction (minimum 0) |
//! | 4    | Tax: each bracket taxes its slice of the taxable base |
//! | 5    | Net: gross − contribution − tax, rounded |
//!
//! The contribution is rounded to the minor currency unit as soon as it is
//! computed. Bracket accumulation runs at full decimal precision; the tax is
//! rounded only when reported, and the reported net is derived from the
//! reported gross, contribution and tax so the breakdown always adds up.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use payroll_core::calculations::NetSalaryCalculator;
//! use payroll_core::{FamilyStatus, PayrollConfig, RawPayrollConfig, TaxBracket};
//!
//! let config = PayrollConfig::validate(RawPayrollConfig {
//!     version: "2024".to_string(),
//!     effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     contribution_rate: dec!(0.0968),
//!     contribution_ceiling: None,
//!     brackets: vec![
//!         TaxBracket::bounded(dec!(200), dec!(0)),
//!         TaxBracket::bounded(dec!(500), dec!(0.15)),
//!         TaxBracket::bounded(dec!(1000), dec!(0.25)),
//!         TaxBracket::unbounded(dec!(0.30)),
//!     ],
//!     family_deduction: Default::default(),
//! })
//! .unwrap();
//!
//! let calculator = NetSalaryCalculator::new(&config);
//! let breakdown = calculator.calculate(dec!(1000), &FamilyStatus::default());
//!
//! assert_eq!(breakdown.contribution, dec!(96.800));
//! assert_eq!(breakdown.tax, dec!(145.800));
//! assert_eq!(breakdown.net, dec!(757.400));
//! ```

use rust_decimal::Decimal;

use crate::calculations::common::{max, round_half_up};
use crate::{FamilyStatus, PayrollConfig, SalaryBreakdown};

/// Intermediate values of one forward evaluation. Only `contribution` is
/// rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ForwardValues {
    contribution: Decimal,
    deduction: Decimal,
    taxable_base: Decimal,
    tax: Decimal,
    net: Decimal,
}

/// Forward salary model over a validated configuration.
///
/// For a fixed family status the net grows with gross, with `net(0) = 0`.
/// Rounding the contribution can take back one minor unit at a rounding
/// boundary; over a few minor units of gross the net strictly increases.
#[derive(Debug, Clone, Copy)]
pub struct NetSalaryCalculator<'a> {
    config: &'a PayrollConfig,
}

impl<'a> NetSalaryCalculator<'a> {
    pub fn new(config: &'a PayrollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a PayrollConfig {
        self.config
    }

    /// Computes the quantized breakdown for a gross salary.
    ///
    /// A gross of zero or less yields an all-zero breakdown.
    pub fn calculate(
        &self,
        gross: Decimal,
        status: &FamilyStatus,
    ) -> SalaryBreakdown {
        if gross <= Decimal::ZERO {
            return SalaryBreakdown::zero();
        }

        let values = self.evaluate(gross, status);
        let gross = round_half_up(gross);
        let tax = round_half_up(values.tax);

        SalaryBreakdown {
            gross,
            contribution: values.contribution,
            deduction: round_half_up(values.deduction),
            taxable_base: round_half_up(values.taxable_base),
            tax,
            net: gross - values.contribution - tax,
        }
    }

    /// Net salary before the tax is rounded, used as the oracle by the gross
    /// solver.
    pub(crate) fn unrounded_net(
        &self,
        gross: Decimal,
        status: &FamilyStatus,
    ) -> Decimal {
        if gross <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.evaluate(gross, status).net
    }

    fn evaluate(
        &self,
        gross: Decimal,
        status: &FamilyStatus,
    ) -> ForwardValues {
        let contribution = self.contribution(gross);
        let deduction = self.config.family_deduction().deduction_for(status);
        let taxable_base = self.taxable_base(gross, contribution, deduction);
        let tax = self.bracket_tax(taxable_base);

        ForwardValues {
            contribution,
            deduction,
            taxable_base,
            tax,
            net: gross - contribution - tax,
        }
    }

    /// Contribution on gross, capped at the configured ceiling and rounded
    /// to the minor unit.
    fn contribution(
        &self,
        gross: Decimal,
    ) -> Decimal {
        let base = match self.config.contribution_ceiling() {
            Some(ceiling) => gross.min(ceiling),
            None => gross,
        };
        round_half_up(base * self.config.contribution_rate())
    }

    fn taxable_base(
        &self,
        gross: Decimal,
        contribution: Decimal,
        deduction: Decimal,
    ) -> Decimal {
        max(gross - contribution - deduction, Decimal::ZERO)
    }

    /// Sums each bracket's rate over the slice of the taxable base it covers.
    fn bracket_tax(
        &self,
        taxable_base: Decimal,
    ) -> Decimal {
        let mut lower = Decimal::ZERO;
        let mut tax = Decimal::ZERO;

        for bracket in self.config.brackets() {
            let upper = match bracket.upper_bound {
                Some(bound) => bound.min(taxable_base),
                None => taxable_base,
            };
            if upper > lower {
                tax += (upper - lower) * bracket.rate;
            }
            match bracket.upper_bound {
                Some(bound) if bound < taxable_base => lower = bound,
                _ => break,
            }
        }

        tax
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use proptest::prelude::{prop_assert, proptest};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{FamilyDeductionTable, RawPayrollConfig, TaxBracket};

    fn fixture_raw() -> RawPayrollConfig {
        RawPayrollConfig {
            version: "fixture".to_string(),
            effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            contribution_rate: dec!(0.0968),
            contribution_ceiling: None,
            brackets: vec![
                TaxBracket::bounded(dec!(200), dec!(0)),
                TaxBracket::bounded(dec!(500), dec!(0.15)),
                TaxBracket::bounded(dec!(1000), dec!(0.25)),
                TaxBracket::unbounded(dec!(0.30)),
            ],
            family_deduction: FamilyDeductionTable::default(),
        }
    }

    fn fixture() -> PayrollConfig {
        PayrollConfig::validate(fixture_raw()).unwrap()
    }

    fn with_family_deduction() -> PayrollConfig {
        let mut raw = fixture_raw();
        raw.family_deduction = FamilyDeductionTable::capped(dec!(150), dec!(90), 4);
        PayrollConfig::validate(raw).unwrap()
    }

    fn single() -> FamilyStatus {
        FamilyStatus::default()
    }

    // =========================================================================
    // contribution tests
    // =========================================================================

    #[test]
    fn contribution_applies_rate_to_gross() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        assert_eq!(calculator.contribution(dec!(1000)), dec!(96.8));
    }

    #[test]
    fn contribution_is_rounded_to_minor_unit() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        // 0.625 * 0.0968 = 0.0605
        assert_eq!(calculator.contribution(dec!(0.625)), dec!(0.061));
        // 333.333 * 0.0968 = 32.2666344
        assert_eq!(calculator.contribution(dec!(333.333)), dec!(32.267));
    }

    #[test]
    fn contribution_is_capped_at_ceiling() {
        let mut raw = fixture_raw();
        raw.contribution_ceiling = Some(dec!(2000));
        let config = PayrollConfig::validate(raw).unwrap();
        let calculator = NetSalaryCalculator::new(&config);

        assert_eq!(calculator.contribution(dec!(5000)), dec!(193.6));
        assert_eq!(calculator.contribution(dec!(1000)), dec!(96.8));
    }

    // =========================================================================
    // bracket_tax tests
    // =========================================================================

    #[test]
    fn bracket_tax_is_zero_inside_exempt_bracket() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        assert_eq!(calculator.bracket_tax(dec!(200)), dec!(0));
    }

    #[test]
    fn bracket_tax_taxes_only_slice_above_bound() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        // (300 - 200) * 0.15
        assert_eq!(calculator.bracket_tax(dec!(300)), dec!(15));
    }

    #[test]
    fn bracket_tax_accumulates_across_brackets() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        // 0 + 300 * 0.15 + 403.2 * 0.25
        assert_eq!(calculator.bracket_tax(dec!(903.2)), dec!(145.8));
    }

    #[test]
    fn bracket_tax_reaches_open_bracket() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        // 45 + 125 + 1000 * 0.30
        assert_eq!(calculator.bracket_tax(dec!(2000)), dec!(470));
    }

    #[test]
    fn bracket_tax_handles_zero_width_first_bracket() {
        let mut raw = fixture_raw();
        raw.brackets = vec![
            TaxBracket::bounded(dec!(0), dec!(0.50)),
            TaxBracket::unbounded(dec!(0.10)),
        ];
        let config = PayrollConfig::validate(raw).unwrap();
        let calculator = NetSalaryCalculator::new(&config);

        assert_eq!(calculator.bracket_tax(dec!(100)), dec!(10));
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn calculate_reference_scenario() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        let result = calculator.calculate(dec!(1000), &single());

        assert_eq!(
            result,
            SalaryBreakdown {
                gross: dec!(1000.000),
                contribution: dec!(96.800),
                deduction: dec!(0.000),
                taxable_base: dec!(903.200),
                tax: dec!(145.800),
                net: dec!(757.400),
            }
        );
    }

    #[test]
    fn calculate_zero_gross_is_all_zero() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        assert_eq!(calculator.calculate(dec!(0), &single()), SalaryBreakdown::zero());
    }

    #[test]
    fn calculate_negative_gross_is_all_zero() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        assert_eq!(
            calculator.calculate(dec!(-50), &single()),
            SalaryBreakdown::zero()
        );
    }

    #[test]
    fn calculate_rounds_contribution_before_taxable_base() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        let result = calculator.calculate(dec!(333.333), &single());

        // contribution 32.2666344 -> 32.267, taxable 301.066, tax 15.1599
        assert_eq!(result.contribution, dec!(32.267));
        assert_eq!(result.taxable_base, dec!(301.066));
        assert_eq!(result.tax, dec!(15.160));
        assert_eq!(result.net, dec!(285.906));
    }

    #[test]
    fn calculate_net_adds_up_at_contribution_midpoint() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        let result = calculator.calculate(dec!(0.625), &single());

        assert_eq!(result.contribution, dec!(0.061));
        assert_eq!(result.tax, dec!(0.000));
        assert_eq!(result.net, dec!(0.564));
    }

    #[test]
    fn calculate_above_contribution_ceiling() {
        let mut raw = fixture_raw();
        raw.contribution_ceiling = Some(dec!(2000));
        let config = PayrollConfig::validate(raw).unwrap();
        let calculator = NetSalaryCalculator::new(&config);

        let result = calculator.calculate(dec!(5000), &single());

        // taxable 5000 - 193.6 = 4806.4; tax 45 + 125 + 3806.4 * 0.30
        assert_eq!(result.contribution, dec!(193.600));
        assert_eq!(result.taxable_base, dec!(4806.400));
        assert_eq!(result.tax, dec!(1311.920));
        assert_eq!(result.net, dec!(3494.480));
    }

    #[test]
    fn calculate_deduction_lowers_taxable_base() {
        let config = with_family_deduction();
        let calculator = NetSalaryCalculator::new(&config);
        let status = FamilyStatus {
            is_head_of_household: true,
            dependents: 2,
        };

        let result = calculator.calculate(dec!(1000), &status);

        // deduction 150 + 2 * 90 = 330; taxable 903.2 - 330 = 573.2
        assert_eq!(result.deduction, dec!(330.000));
        assert_eq!(result.taxable_base, dec!(573.200));
        // 45 + 73.2 * 0.25 = 63.3
        assert_eq!(result.tax, dec!(63.300));
        assert_eq!(result.net, dec!(839.900));
    }

    #[test]
    fn calculate_large_deduction_clamps_taxable_base_to_zero() {
        let config = with_family_deduction();
        let calculator = NetSalaryCalculator::new(&config);
        let status = FamilyStatus {
            is_head_of_household: true,
            dependents: 4,
        };

        let result = calculator.calculate(dec!(400), &status);

        assert_eq!(result.taxable_base, dec!(0.000));
        assert_eq!(result.tax, dec!(0.000));
        assert_eq!(result.net, dec!(361.280));
    }

    #[test]
    fn unrounded_net_is_zero_at_zero() {
        let config = fixture();
        let calculator = NetSalaryCalculator::new(&config);

        assert_eq!(calculator.unrounded_net(dec!(0), &single()), dec!(0));
    }

    // =========================================================================
    // properties
    // =========================================================================

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_net_strictly_increases_beyond_resolution(
            gross_milli in 0u64..50_000_000,
            step_milli in 5u64..5_000_000
        ) {
            let config = fixture();
            let calculator = NetSalaryCalculator::new(&config);
            let lower = Decimal::new(gross_milli as i64, 3);
            let upper = Decimal::new((gross_milli + step_milli) as i64, 3);

            let net_lower = calculator.calculate(lower, &single()).net;
            let net_upper = calculator.calculate(upper, &single()).net;

            prop_assert!(net_lower < net_upper, "{lower} -> {net_lower}, {upper} -> {net_upper}");
        }

        #[test]
        fn prop_more_dependents_never_lower_net(
            gross_milli in 0u64..20_000_000,
            dependents in 0u32..8,
            is_head_of_household in proptest::bool::ANY
        ) {
            let config = with_family_deduction();
            let calculator = NetSalaryCalculator::new(&config);
            let gross = Decimal::new(gross_milli as i64, 3);
            let fewer = FamilyStatus { is_head_of_household, dependents };
            let more = FamilyStatus { is_head_of_household, dependents: dependents + 1 };

            let net_fewer = calculator.calculate(gross, &fewer).net;
            let net_more = calculator.calculate(gross, &more).net;

            prop_assert!(net_fewer <= net_more);
        }

        #[test]
        fn prop_net_never_exceeds_gross(gross_milli in 0u64..50_000_000) {
            let config = fixture();
            let calculator = NetSalaryCalculator::new(&config);
            let gross = Decimal::new(gross_milli as i64, 3);

            let result = calculator.calculate(gross, &single());

            prop_assert!(result.net <= result.gross);
            prop_assert!(result.net >= Decimal::ZERO);
        }

        #[test]
        fn prop_breakdown_adds_up(
            gross_milli in 0u64..20_000_000,
            dependents in 0u32..6,
            is_head_of_household in proptest::bool::ANY,
            with_ceiling in proptest::bool::ANY
        ) {
            let mut raw = fixture_raw();
            raw.family_deduction = FamilyDeductionTable::capped(dec!(150), dec!(90), 4);
            if with_ceiling {
                raw.contribution_ceiling = Some(dec!(2000));
            }
            let config = PayrollConfig::validate(raw).unwrap();
            let calculator = NetSalaryCalculator::new(&config);
            let gross = Decimal::new(gross_milli as i64, 3);
            let status = FamilyStatus { is_head_of_household, dependents };

            let result = calculator.calculate(gross, &status);

            prop_assert!(
                result.gross - result.contribution - result.tax == result.net,
                "{result:?}"
            );
        }
    }
}
