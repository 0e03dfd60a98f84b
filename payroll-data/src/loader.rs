use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use payroll_core::{ConfigError, FamilyDeductionTable, PayrollConfig, RawPayrollConfig, TaxBracket};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading a payroll configuration.
#[derive(Debug, Error)]
pub enum ConfigLoaderError {
    #[error("Cannot read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

impl From<csv::Error> for ConfigLoaderError {
    fn from(err: csv::Error) -> Self {
        ConfigLoaderError::CsvParse(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigLoaderError {
    fn from(err: toml::de::Error) -> Self {
        ConfigLoaderError::TomlParse(err.to_string())
    }
}

/// The TOML document describing one configuration version.
///
/// Mirrors [`RawPayrollConfig`] except that `brackets` may be omitted when
/// they are supplied separately as CSV. Dates and amounts are written as
/// strings (`effective_from = "2024-01-01"`, `rate = "0.15"`).
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    version: String,
    effective_from: NaiveDate,
    contribution_rate: Decimal,
    #[serde(default)]
    contribution_ceiling: Option<Decimal>,
    #[serde(default)]
    brackets: Vec<TaxBracket>,
    #[serde(default)]
    family_deduction: FamilyDeductionTable,
}

impl From<ConfigDocument> for RawPayrollConfig {
    fn from(doc: ConfigDocument) -> Self {
        RawPayrollConfig {
            version: doc.version,
            effective_from: doc.effective_from,
            contribution_rate: doc.contribution_rate,
            contribution_ceiling: doc.contribution_ceiling,
            brackets: doc.brackets,
            family_deduction: doc.family_deduction,
        }
    }
}

/// A single row of a bracket CSV file.
///
/// - `upper_bound`: inclusive upper bound of the bracket (empty for the open
///   top bracket)
/// - `rate`: marginal rate as a decimal (e.g., 0.15 for 15%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct BracketRecord {
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    upper_bound: Option<Decimal>,
    rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loads validated configurations from TOML documents and bracket CSV files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<PayrollConfig, ConfigLoaderError> {
        let raw = Self::raw_from_toml_str(text)?;
        Ok(PayrollConfig::validate(raw)?)
    }

    /// Parse and validate a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<PayrollConfig, ConfigLoaderError> {
        let text = read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), version = config.version(), "configuration loaded");
        Ok(config)
    }

    /// Like [`ConfigLoader::from_toml_file`], with the brackets taken from a
    /// CSV file instead of the TOML document.
    pub fn from_files(
        toml_path: &Path,
        brackets_path: &Path,
    ) -> Result<PayrollConfig, ConfigLoaderError> {
        let mut raw = Self::raw_from_toml_str(&read_to_string(toml_path)?)?;

        let file = File::open(brackets_path).map_err(|e| ConfigLoaderError::Io {
            path: brackets_path.display().to_string(),
            message: e.to_string(),
        })?;
        raw.brackets = Self::parse_brackets_csv(file)?;

        let config = PayrollConfig::validate(raw)?;
        debug!(
            toml = %toml_path.display(),
            brackets = %brackets_path.display(),
            version = config.version(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse bracket rows from a CSV reader with an `upper_bound,rate` header.
    ///
    /// Rows are kept in file order; ordering is checked when the
    /// configuration is validated.
    pub fn parse_brackets_csv<R: Read>(reader: R) -> Result<Vec<TaxBracket>, ConfigLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut brackets = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            brackets.push(TaxBracket {
                upper_bound: record.upper_bound,
                rate: record.rate,
            });
        }

        Ok(brackets)
    }

    fn raw_from_toml_str(text: &str) -> Result<RawPayrollConfig, ConfigLoaderError> {
        let doc: ConfigDocument = toml::from_str(text)?;
        Ok(doc.into())
    }
}

fn read_to_string(path: &Path) -> Result<String, ConfigLoaderError> {
    std::fs::read_to_string(path).map_err(|e| ConfigLoaderError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
