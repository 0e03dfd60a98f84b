use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use payroll_core::{
    ConfigVersion, FamilyDeductionTable, NewSalaryRecord, PayrollConfig, PayrollRepository,
    RawPayrollConfig, RepositoryError, SalaryRecord, TaxBracket,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::decimal::{get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_config_rows(
        tx: &mut Transaction<'_, Sqlite>,
        config: &PayrollConfig,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO payroll_config (
                version, effective_from, contribution_rate, contribution_ceiling,
                head_of_household_deduction
            ) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(config.version())
        .bind(config.effective_from())
        .bind(config.contribution_rate().to_string())
        .bind(config.contribution_ceiling().map(|d| d.to_string()))
        .bind(config.family_deduction().head_of_household.to_string())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            let message = e.to_string();
            if message.contains("UNIQUE constraint failed") {
                RepositoryError::Conflict(format!(
                    "configuration version '{}' already exists",
                    config.version()
                ))
            } else {
                RepositoryError::Database(message)
            }
        })?;

        for (position, bracket) in config.brackets().iter().enumerate() {
            sqlx::query(
                "INSERT INTO tax_bracket (config_version, position, upper_bound, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(config.version())
            .bind(position as i64)
            .bind(bracket.upper_bound.map(|d| d.to_string()))
            .bind(bracket.rate.to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        for (position, amount) in config.family_deduction().per_dependent.iter().enumerate() {
            sqlx::query(
                "INSERT INTO dependent_deduction (config_version, position, amount)
                 VALUES (?, ?, ?)",
            )
            .bind(config.version())
            .bind(position as i64)
            .bind(amount.to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        Ok(())
    }
}

fn row_to_bracket(row: &SqliteRow) -> Result<TaxBracket, RepositoryError> {
    Ok(TaxBracket {
        upper_bound: get_optional_decimal(row, "upper_bound")?,
        rate: get_decimal(row, "rate")?,
    })
}

fn row_to_salary_record(row: &SqliteRow) -> Result<SalaryRecord, RepositoryError> {
    let dependents: i64 = row
        .try_get("dependents")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

    Ok(SalaryRecord {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        employee_id: row
            .try_get("employee_id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        effective_date: row
            .try_get::<NaiveDate, _>("effective_date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get effective_date: {}", e)))?,
        gross: get_decimal(row, "gross")?,
        net: get_decimal(row, "net")?,
        is_head_of_household: row
            .try_get("is_head_of_household")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        dependents: u32::try_from(dependents).map_err(|_| {
            RepositoryError::Database(format!("Invalid dependents count: {}", dependents))
        })?,
        config_version: row
            .try_get("config_version")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

#[async_trait]
impl PayrollRepository for SqliteRepository {
    async fn insert_config(
        &self,
        config: &PayrollConfig,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Self::insert_config_rows(&mut tx, config).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(
            version = config.version(),
            effective_from = %config.effective_from(),
            brackets = config.brackets().len(),
            "stored payroll configuration"
        );
        Ok(())
    }

    async fn get_config(
        &self,
        version: &str,
    ) -> Result<PayrollConfig, RepositoryError> {
        let row = sqlx::query(
            "SELECT version, effective_from, contribution_rate, contribution_ceiling,
                    head_of_household_deduction
             FROM payroll_config WHERE version = ?",
        )
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        let brackets = sqlx::query(
            "SELECT upper_bound, rate FROM tax_bracket
             WHERE config_version = ? ORDER BY position",
        )
        .bind(version)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .iter()
        .map(row_to_bracket)
        .collect::<Result<Vec<_>, _>>()?;

        let per_dependent = sqlx::query(
            "SELECT amount FROM dependent_deduction
             WHERE config_version = ? ORDER BY position",
        )
        .bind(version)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .iter()
        .map(|r| get_decimal(r, "amount"))
        .collect::<Result<Vec<_>, _>>()?;

        let raw = RawPayrollConfig {
            version: row
                .try_get("version")
                .map_err(|e| RepositoryError::Database(e.to_string()))?,
            effective_from: row
                .try_get::<NaiveDate, _>("effective_from")
                .map_err(|e| {
                    RepositoryError::Database(format!("Failed to get effective_from: {}", e))
                })?,
            contribution_rate: get_decimal(&row, "contribution_rate")?,
            contribution_ceiling: get_optional_decimal(&row, "contribution_ceiling")?,
            brackets,
            family_deduction: FamilyDeductionTable {
                head_of_household: get_decimal(&row, "head_of_household_deduction")?,
                per_dependent,
            },
        };

        Ok(PayrollConfig::validate(raw)?)
    }

    async fn get_config_effective_on(
        &self,
        date: NaiveDate,
    ) -> Result<PayrollConfig, RepositoryError> {
        let (version,): (String,) = sqlx::query_as(
            "SELECT version FROM payroll_config
             WHERE effective_from <= ?
             ORDER BY effective_from DESC
             LIMIT 1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        self.get_config(&version).await
    }

    async fn list_config_versions(&self) -> Result<Vec<ConfigVersion>, RepositoryError> {
        let rows: Vec<(String, NaiveDate)> = sqlx::query_as(
            "SELECT version, effective_from FROM payroll_config ORDER BY effective_from DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(version, effective_from)| ConfigVersion {
                version,
                effective_from,
            })
            .collect())
    }

    async fn create_salary_record(
        &self,
        record: NewSalaryRecord,
    ) -> Result<SalaryRecord, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO salary_record (
                employee_id, effective_date, gross, net, is_head_of_household,
                dependents, config_version, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.employee_id)
        .bind(record.effective_date)
        .bind(record.gross.to_string())
        .bind(record.net.to_string())
        .bind(record.is_head_of_household)
        .bind(i64::from(record.dependents))
        .bind(&record.config_version)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let message = e.to_string();
            if message.contains("FOREIGN KEY constraint failed") {
                RepositoryError::Database(format!(
                    "unknown configuration version '{}'",
                    record.config_version
                ))
            } else {
                RepositoryError::Database(message)
            }
        })?;

        let id = result.last_insert_rowid();
        self.get_salary_record(id).await
    }

    async fn get_salary_record(
        &self,
        id: i64,
    ) -> Result<SalaryRecord, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, employee_id, effective_date, gross, net, is_head_of_household,
                    dependents, config_version, created_at
             FROM salary_record WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row_to_salary_record(&row)
    }

    async fn list_salary_records(
        &self,
        employee_id: i64,
    ) -> Result<Vec<SalaryRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, employee_id, effective_date, gross, net, is_head_of_household,
                    dependents, config_version, created_at
             FROM salary_record
             WHERE employee_id = ?
             ORDER BY effective_date DESC, id DESC",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_salary_record).collect()
    }
}
