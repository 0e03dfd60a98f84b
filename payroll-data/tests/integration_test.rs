//! Integration tests for configuration loading and salary recording against
//! the SQLite backend.

use std::path::PathBuf;

use chrono::NaiveDate;
use payroll_core::{
    FamilyStatus, PayrollRepository, RecordError, RepositoryError, SalaryRecorder, compute_net,
};
use payroll_data::{ConfigLoader, ConfigLoaderError};
use payroll_db_sqlite::SqliteRepository;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const TEST_TOML_2024: &str = include_str!("../test-data/payroll_2024.toml");

fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test-data")
        .join(name)
}

fn date(
    year: i32,
    month: u32,
    day: u32,
) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");

    repo
}

/// A database holding the 2024 (inline brackets) and 2025 (CSV brackets)
/// configuration versions.
async fn setup_seeded_db() -> SqliteRepository {
    let repo = setup_test_db().await;

    let config_2024 = ConfigLoader::from_toml_str(TEST_TOML_2024).expect("Failed to load 2024");
    let config_2025 = ConfigLoader::from_files(
        &test_data("payroll_2025.toml"),
        &test_data("brackets_2025.csv"),
    )
    .expect("Failed to load 2025");

    repo.insert_config(&config_2024)
        .await
        .expect("Failed to store 2024");
    repo.insert_config(&config_2025)
        .await
        .expect("Failed to store 2025");

    repo
}

#[test]
fn test_toml_file_and_str_agree() {
    let from_file =
        ConfigLoader::from_toml_file(&test_data("payroll_2024.toml")).expect("Failed to load");
    let from_str = ConfigLoader::from_toml_str(TEST_TOML_2024).expect("Failed to load");

    assert_eq!(from_file, from_str);
}

#[test]
fn test_toml_without_csv_has_no_brackets() {
    let result = ConfigLoader::from_toml_file(&test_data("payroll_2025.toml"));

    assert!(matches!(result, Err(ConfigLoaderError::Invalid(_))));
}

#[test]
fn test_loaded_configuration_reference_scenario() {
    let config = ConfigLoader::from_toml_str(TEST_TOML_2024).expect("Failed to load");

    let breakdown = compute_net(dec!(1000), false, 0, &config).expect("Failed to compute");

    assert_eq!(breakdown.contribution, dec!(96.800));
    assert_eq!(breakdown.tax, dec!(145.800));
    assert_eq!(breakdown.net, dec!(757.400));
}

#[tokio::test]
async fn test_stored_configuration_round_trips() {
    let repo = setup_test_db().await;
    let config = ConfigLoader::from_files(
        &test_data("payroll_2025.toml"),
        &test_data("brackets_2025.csv"),
    )
    .expect("Failed to load");

    repo.insert_config(&config)
        .await
        .expect("Failed to store");
    let fetched = repo.get_config("2025").await.expect("Failed to fetch");

    assert_eq!(fetched, config);
}

#[tokio::test]
async fn test_import_same_version_twice_conflicts() {
    let repo = setup_seeded_db().await;
    let config = ConfigLoader::from_toml_str(TEST_TOML_2024).expect("Failed to load");

    let result = repo.insert_config(&config).await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
async fn test_record_from_net_picks_version_by_date() {
    let repo = setup_seeded_db().await;
    let recorder = SalaryRecorder::new(&repo);

    let in_2024 = recorder
        .record_from_net(1, date(2024, 6, 1), dec!(757.400), FamilyStatus::default())
        .await
        .expect("Failed to record 2024");
    let in_2025 = recorder
        .record_from_net(1, date(2025, 6, 1), dec!(772.500), FamilyStatus::default())
        .await
        .expect("Failed to record 2025");

    assert_eq!(in_2024.config_version, "2024");
    assert_eq!(in_2024.gross, dec!(1000.000));
    assert_eq!(in_2025.config_version, "2025");
    assert_eq!(in_2025.gross, dec!(1000.000));
    assert_eq!(in_2025.net, dec!(772.500));
}

#[tokio::test]
async fn test_record_with_family_status_is_reproducible() {
    let repo = setup_seeded_db().await;
    let recorder = SalaryRecorder::new(&repo);
    let status = FamilyStatus::new(true, 2).expect("Valid status");

    let record = recorder
        .record_from_net(9, date(2024, 2, 1), dec!(839.900), status)
        .await
        .expect("Failed to record");
    let stored = repo
        .get_salary_record(record.id)
        .await
        .expect("Failed to fetch record");
    let recomputed = recorder.recompute(&stored).await.expect("Failed to recompute");

    assert_eq!(stored.gross, dec!(1000.000));
    assert_eq!(stored.family_status(), status);
    assert_eq!(recomputed.gross, stored.gross);
    assert_eq!(recomputed.net, stored.net);
    assert_eq!(recomputed.deduction, dec!(330.000));
}

#[tokio::test]
async fn test_record_before_first_version_fails() {
    let repo = setup_seeded_db().await;
    let recorder = SalaryRecorder::new(&repo);

    let result = recorder
        .record_from_net(1, date(2023, 12, 31), dec!(500), FamilyStatus::default())
        .await;

    assert_eq!(result, Err(RecordError::NoEffectiveConfig(date(2023, 12, 31))));
    assert!(
        repo.list_salary_records(1)
            .await
            .expect("Failed to list")
            .is_empty()
    );
}

#[tokio::test]
async fn test_list_records_after_recording() {
    let repo = setup_seeded_db().await;
    let recorder = SalaryRecorder::new(&repo);
    recorder
        .record_from_gross(5, date(2024, 1, 15), dec!(1000), FamilyStatus::default())
        .await
        .expect("Failed to record");
    recorder
        .record_from_gross(5, date(2025, 1, 15), dec!(1000), FamilyStatus::default())
        .await
        .expect("Failed to record");

    let records = repo.list_salary_records(5).await.expect("Failed to list");

    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.config_version.as_str(), r.net))
        .collect();
    assert_eq!(summary, vec![("2025", dec!(772.500)), ("2024", dec!(757.400))]);
}
