use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    ConfigError, ConfigVersion, NewSalaryRecord, PayrollConfig, SalaryRecord,
};

#[derive(Debug, Error, PartialEq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Stored configuration is invalid: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Storage for configuration versions and salary records.
///
/// Configurations are append-only: a new version is inserted, never
/// overwritten, so records pinned to an older version stay reproducible.
#[async_trait]
pub trait PayrollRepository: Send + Sync {
    // Configuration versions
    async fn insert_config(&self, config: &PayrollConfig) -> Result<(), RepositoryError>;
    async fn get_config(&self, version: &str) -> Result<PayrollConfig, RepositoryError>;
    async fn get_config_effective_on(
        &self,
        date: NaiveDate,
    ) -> Result<PayrollConfig, RepositoryError>;
    async fn list_config_versions(&self) -> Result<Vec<ConfigVersion>, RepositoryError>;

    // Salary records
    async fn create_salary_record(
        &self,
        record: NewSalaryRecord,
    ) -> Result<SalaryRecord, RepositoryError>;

    async fn get_salary_record(&self, id: i64) -> Result<SalaryRecord, RepositoryError>;

    async fn list_salary_records(
        &self,
        employee_id: i64,
    ) -> Result<Vec<SalaryRecord>, RepositoryError>;
}
