use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use super::repository::{PayrollRepository, RepositoryError};
use crate::calculations::{NetSalaryCalculator, PayrollError, SolverSettings, solve_gross};
use crate::models::{
    FamilyStatus, NewSalaryRecord, PayrollConfig, SalaryBreakdown, SalaryRecord, ValidationError,
};

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("no payroll configuration is effective on {0}")]
    NoEffectiveConfig(NaiveDate),

    #[error(transparent)]
    Payroll(#[from] PayrollError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Computes salary figures and stores them pinned to the configuration
/// version they were computed with.
pub struct SalaryRecorder<'r, R: PayrollRepository + ?Sized> {
    repo: &'r R,
    settings: SolverSettings,
}

impl<'r, R: PayrollRepository + ?Sized> SalaryRecorder<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self {
            repo,
            settings: SolverSettings::default(),
        }
    }

    pub fn with_settings(
        repo: &'r R,
        settings: SolverSettings,
    ) -> Self {
        Self { repo, settings }
    }

    /// Solves the gross for `net_target` under the configuration effective on
    /// `effective_date` and stores the resulting record.
    pub async fn record_from_net(
        &self,
        employee_id: i64,
        effective_date: NaiveDate,
        net_target: Decimal,
        status: FamilyStatus,
    ) -> Result<SalaryRecord, RecordError> {
        let config = self.effective_config(effective_date).await?;
        let gross = solve_gross(net_target, &status, &config, self.settings)?;
        let breakdown = NetSalaryCalculator::new(&config).calculate(gross, &status);

        self.store(employee_id, effective_date, &config, &breakdown, status)
            .await
    }

    /// Stores a record for a gross entered directly. A negative gross is
    /// rejected rather than stored as zero.
    pub async fn record_from_gross(
        &self,
        employee_id: i64,
        effective_date: NaiveDate,
        gross: Decimal,
        status: FamilyStatus,
    ) -> Result<SalaryRecord, RecordError> {
        if gross < Decimal::ZERO {
            return Err(PayrollError::Validation(ValidationError::NegativeGross(gross)).into());
        }
        let config = self.effective_config(effective_date).await?;
        let breakdown = NetSalaryCalculator::new(&config).calculate(gross, &status);

        self.store(employee_id, effective_date, &config, &breakdown, status)
            .await
    }

    /// Recomputes a stored record against the configuration version it was
    /// pinned to, regardless of which version is current now.
    pub async fn recompute(
        &self,
        record: &SalaryRecord,
    ) -> Result<SalaryBreakdown, RecordError> {
        let config = self.repo.get_config(&record.config_version).await?;
        Ok(NetSalaryCalculator::new(&config).calculate(record.gross, &record.family_status()))
    }

    async fn effective_config(
        &self,
        date: NaiveDate,
    ) -> Result<PayrollConfig, RecordError> {
        self.repo
            .get_config_effective_on(date)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => RecordError::NoEffectiveConfig(date),
                other => RecordError::Repository(other),
            })
    }

    async fn store(
        &self,
        employee_id: i64,
        effective_date: NaiveDate,
        config: &PayrollConfig,
        breakdown: &SalaryBreakdown,
        status: FamilyStatus,
    ) -> Result<SalaryRecord, RecordError> {
        let record = self
            .repo
            .create_salary_record(NewSalaryRecord {
                employee_id,
                effective_date,
                gross: breakdown.gross,
                net: breakdown.net,
                is_head_of_household: status.is_head_of_household,
                dependents: status.dependents,
                config_version: config.version().to_string(),
            })
            .await?;

        info!(
            record_id = record.id,
            employee_id,
            %effective_date,
            gross = %record.gross,
            net = %record.net,
            config = config.version(),
            "salary record stored"
        );
        Ok(record)
    }
}
