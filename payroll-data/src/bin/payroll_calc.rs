use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use payroll_core::{
    FamilyStatus, PayrollConfig, PayrollRepository, SalaryBreakdown, SalaryRecorder,
    compute_gross_breakdown_from_net, compute_net,
};
use payroll_data::{ConfigLoader, logging};
use payroll_db_sqlite::SqliteRepository;
use rust_decimal::Decimal;
use tracing::info;

/// Gross/net salary calculator.
///
/// Configuration files are TOML documents; brackets may be given inline or
/// as a CSV file with `upper_bound,rate` columns (empty `upper_bound` for the
/// top bracket).
#[derive(Parser, Debug)]
#[command(name = "payroll-calc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level or filter directive (defaults to RUST_LOG, then "info")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append log output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the net salary for a gross salary
    Net {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(long)]
        gross: Decimal,

        #[command(flatten)]
        family: FamilyArgs,
    },

    /// Compute the gross salary that pays a target net salary
    Gross {
        #[command(flatten)]
        config: ConfigArgs,

        #[arg(long)]
        net: Decimal,

        #[command(flatten)]
        family: FamilyArgs,
    },

    /// Validate a configuration and store it as a new version
    Import {
        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// Solve the gross for a net salary and store it for an employee
    Record {
        #[command(flatten)]
        database: DatabaseArgs,

        #[arg(long)]
        employee: i64,

        /// Effective date (YYYY-MM-DD); selects the configuration version
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        net: Decimal,

        #[command(flatten)]
        family: FamilyArgs,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Path to the TOML configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Path to a bracket CSV replacing the brackets of the TOML file
    #[arg(short, long)]
    brackets: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<PayrollConfig> {
        let config = match &self.brackets {
            Some(brackets) => ConfigLoader::from_files(&self.config, brackets),
            None => ConfigLoader::from_toml_file(&self.config),
        };
        config.with_context(|| format!("Failed to load configuration: {}", self.config.display()))
    }
}

#[derive(Args, Debug)]
struct FamilyArgs {
    #[arg(long, default_value_t = false)]
    head_of_household: bool,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    dependents: i64,
}

impl FamilyArgs {
    fn status(&self) -> Result<FamilyStatus> {
        Ok(FamilyStatus::new(self.head_of_household, self.dependents)?)
    }
}

#[derive(Args, Debug)]
struct DatabaseArgs {
    /// SQLite database URL (e.g., sqlite:payroll.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:payroll.db?mode=rwc")]
    database: String,

    /// Run database migrations first
    #[arg(short, long, default_value_t = false)]
    migrate: bool,
}

impl DatabaseArgs {
    async fn connect(&self) -> Result<SqliteRepository> {
        let repo = SqliteRepository::new(&self.database)
            .await
            .with_context(|| format!("Failed to connect to database: {}", self.database))?;

        if self.migrate {
            repo.run_migrations()
                .await
                .context("Failed to run migrations")?;
            info!(database = %self.database, "migrations complete");
        }

        Ok(repo)
    }
}

fn print_breakdown(breakdown: &SalaryBreakdown) {
    println!("gross         {:>14}", breakdown.gross);
    println!("contribution  {:>14}", breakdown.contribution);
    println!("deduction     {:>14}", breakdown.deduction);
    println!("taxable base  {:>14}", breakdown.taxable_base);
    println!("tax           {:>14}", breakdown.tax);
    println!("net           {:>14}", breakdown.net);
}

async fn import(
    config_path: &Path,
    config: PayrollConfig,
    database: &DatabaseArgs,
) -> Result<()> {
    let repo = database.connect().await?;
    repo.insert_config(&config)
        .await
        .with_context(|| format!("Failed to store configuration: {}", config_path.display()))?;

    println!(
        "Stored configuration version '{}' effective from {}.",
        config.version(),
        config.effective_from()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    match cli.command {
        Command::Net {
            config,
            gross,
            family,
        } => {
            let loaded = config.load()?;
            let breakdown = compute_net(
                gross,
                family.head_of_household,
                family.dependents,
                &loaded,
            )?;
            print_breakdown(&breakdown);
        }
        Command::Gross {
            config,
            net,
            family,
        } => {
            let loaded = config.load()?;
            let breakdown = compute_gross_breakdown_from_net(
                net,
                family.head_of_household,
                family.dependents,
                &loaded,
            )
            .with_context(|| format!("Failed to solve gross for net {}", net))?;
            print_breakdown(&breakdown);
        }
        Command::Import { config, database } => {
            let loaded = config.load()?;
            import(&config.config, loaded, &database).await?;
        }
        Command::Record {
            database,
            employee,
            date,
            net,
            family,
        } => {
            let repo = database.connect().await?;
            let record = SalaryRecorder::new(&repo)
                .record_from_net(employee, date, net, family.status()?)
                .await
                .context("Failed to record salary")?;
            println!(
                "Recorded #{} for employee {}: gross {} net {} (configuration '{}').",
                record.id, record.employee_id, record.gross, record.net, record.config_version
            );
        }
    }

    Ok(())
}
