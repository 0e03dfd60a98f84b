//! Tax and contribution configuration.
//!
//! A [`RawPayrollConfig`] is what a configuration source hands over: a plain
//! serde value with no guarantees. [`PayrollConfig::validate`] turns it into
//! an immutable [`PayrollConfig`], the only form the calculators accept.
//! A changed configuration is a new value with its own version label.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FamilyDeductionTable, TaxBracket};

/// Malformed configuration. Not retryable; the source must be fixed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration version label must not be empty")]
    EmptyVersion,

    #[error("no tax brackets provided")]
    NoBrackets,

    #[error("first bracket bound must be non-negative, got {0}")]
    NegativeFirstBound(Decimal),

    #[error("bracket {index} bound {bound} does not exceed previous bound {previous}")]
    UnsortedBrackets {
        index: usize,
        bound: Decimal,
        previous: Decimal,
    },

    #[error("bracket {0} is unbounded but is not the last bracket")]
    UnboundedBracketNotLast(usize),

    #[error("last bracket must be unbounded, got bound {0}")]
    BoundedLastBracket(Decimal),

    #[error("bracket {index} rate must be between 0 and 1, got {rate}")]
    InvalidBracketRate { index: usize, rate: Decimal },

    #[error("contribution rate must be between 0 and 1, got {0}")]
    InvalidContributionRate(Decimal),

    #[error("contribution ceiling must be positive, got {0}")]
    InvalidContributionCeiling(Decimal),

    #[error("head-of-household deduction must be non-negative, got {0}")]
    NegativeHeadOfHouseholdDeduction(Decimal),

    #[error("deduction for dependent {index} must be non-negative, got {amount}")]
    NegativeDependentDeduction { index: usize, amount: Decimal },
}

/// Unvalidated configuration as supplied by a configuration source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPayrollConfig {
    pub version: String,
    pub effective_from: NaiveDate,
    pub contribution_rate: Decimal,
    #[serde(default)]
    pub contribution_ceiling: Option<Decimal>,
    pub brackets: Vec<TaxBracket>,
    #[serde(default)]
    pub family_deduction: FamilyDeductionTable,
}

/// Identifies one configuration among its historical versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigVersion {
    pub version: String,
    pub effective_from: NaiveDate,
}

/// Validated, immutable tax and contribution configuration.
///
/// Deserializing goes through [`PayrollConfig::validate`], so a value of this
/// type always satisfies the bracket, rate and deduction invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPayrollConfig", into = "RawPayrollConfig")]
pub struct PayrollConfig {
    version: ConfigVersion,
    contribution_rate: Decimal,
    contribution_ceiling: Option<Decimal>,
    brackets: Vec<TaxBracket>,
    family_deduction: FamilyDeductionTable,
}

impl PayrollConfig {
    /// Checks every configuration invariant and freezes the result.
    ///
    /// Brackets are checked in the order given; they are never re-sorted.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    /// use payroll_core::{ConfigError, PayrollConfig, RawPayrollConfig, TaxBracket};
    ///
    /// let raw = RawPayrollConfig {
    ///     version: "2024".to_string(),
    ///     effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     contribution_rate: dec!(0.0968),
    ///     contribution_ceiling: None,
    ///     brackets: vec![
    ///         TaxBracket::bounded(dec!(500), dec!(0.15)),
    ///         TaxBracket::bounded(dec!(200), dec!(0)),
    ///         TaxBracket::unbounded(dec!(0.30)),
    ///     ],
    ///     family_deduction: Default::default(),
    /// };
    ///
    /// assert!(matches!(
    ///     PayrollConfig::validate(raw),
    ///     Err(ConfigError::UnsortedBrackets { index: 1, .. })
    /// ));
    /// ```
    pub fn validate(raw: RawPayrollConfig) -> Result<Self, ConfigError> {
        if raw.version.trim().is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        validate_brackets(&raw.brackets)?;
        if !is_unit_rate(raw.contribution_rate) {
            return Err(ConfigError::InvalidContributionRate(raw.contribution_rate));
        }
        if let Some(ceiling) = raw.contribution_ceiling {
            if ceiling <= Decimal::ZERO {
                return Err(ConfigError::InvalidContributionCeiling(ceiling));
            }
        }
        validate_family_deduction(&raw.family_deduction)?;

        Ok(Self {
            version: ConfigVersion {
                version: raw.version,
                effective_from: raw.effective_from,
            },
            contribution_rate: raw.contribution_rate,
            contribution_ceiling: raw.contribution_ceiling,
            brackets: raw.brackets,
            family_deduction: raw.family_deduction,
        })
    }

    pub fn version(&self) -> &str {
        &self.version.version
    }

    pub fn effective_from(&self) -> NaiveDate {
        self.version.effective_from
    }

    pub fn config_version(&self) -> &ConfigVersion {
        &self.version
    }

    pub fn contribution_rate(&self) -> Decimal {
        self.contribution_rate
    }

    pub fn contribution_ceiling(&self) -> Option<Decimal> {
        self.contribution_ceiling
    }

    /// Brackets in ascending bound order; the last one is unbounded.
    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn family_deduction(&self) -> &FamilyDeductionTable {
        &self.family_deduction
    }
}

impl TryFrom<RawPayrollConfig> for PayrollConfig {
    type Error = ConfigError;

    fn try_from(raw: RawPayrollConfig) -> Result<Self, Self::Error> {
        Self::validate(raw)
    }
}

impl From<PayrollConfig> for RawPayrollConfig {
    fn from(config: PayrollConfig) -> Self {
        Self {
            version: config.version.version,
            effective_from: config.version.effective_from,
            contribution_rate: config.contribution_rate,
            contribution_ceiling: config.contribution_ceiling,
            brackets: config.brackets,
            family_deduction: config.family_deduction,
        }
    }
}

/// Picks the configuration in force on `date`: the one with the latest
/// `effective_from` not after `date`.
pub fn select_effective(
    configs: &[PayrollConfig],
    date: NaiveDate,
) -> Option<&PayrollConfig> {
    configs
        .iter()
        .filter(|c| c.effective_from() <= date)
        .max_by_key(|c| c.effective_from())
}

fn is_unit_rate(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate <= Decimal::ONE
}

fn validate_brackets(brackets: &[TaxBracket]) -> Result<(), ConfigError> {
    let Some(last_index) = brackets.len().checked_sub(1) else {
        return Err(ConfigError::NoBrackets);
    };

    let mut previous: Option<Decimal> = None;
    for (index, bracket) in brackets.iter().enumerate() {
        if !is_unit_rate(bracket.rate) {
            return Err(ConfigError::InvalidBracketRate {
                index,
                rate: bracket.rate,
            });
        }

        match (bracket.upper_bound, index == last_index) {
            (None, true) => {}
            (None, false) => return Err(ConfigError::UnboundedBracketNotLast(index)),
            (Some(bound), true) => return Err(ConfigError::BoundedLastBracket(bound)),
            (Some(bound), false) => {
                match previous {
                    None if bound < Decimal::ZERO => {
                        return Err(ConfigError::NegativeFirstBound(bound));
                    }
                    Some(prev) if bound <= prev => {
                        return Err(ConfigError::UnsortedBrackets {
                            index,
                            bound,
                            previous: prev,
                        });
                    }
                    _ => {}
                }
                previous = Some(bound);
            }
        }
    }

    Ok(())
}

fn validate_family_deduction(table: &FamilyDeductionTable) -> Result<(), ConfigError> {
    if table.head_of_household < Decimal::ZERO {
        return Err(ConfigError::NegativeHeadOfHouseholdDeduction(
            table.head_of_household,
        ));
    }
    if let Some((index, amount)) = table
        .per_dependent
        .iter()
        .enumerate()
        .find(|(_, amount)| **amount < Decimal::ZERO)
    {
        return Err(ConfigError::NegativeDependentDeduction {
            index,
            amount: *amount,
        });
    }
    Ok(())
}
