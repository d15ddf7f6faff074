// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command-line surface: one subcommand per pipeline step, plus the
//! standalone `validator` argument handling.

use crate::config::{
    ExportConfig, MetadataStoreConfig, NotifyConfig, ObjectStoreConfig, StravaConfig,
    WarehouseConfig,
};
use crate::db::{MySqlWatermarkStore, RedshiftWarehouse};
use crate::error::Result;
use crate::services::export::export_key;
use crate::services::model::DEFAULT_MODEL_SCRIPT;
use crate::services::storage::s3_uri;
use crate::services::validator::{Operator, Severity, ValidationCheck};
use crate::services::{
    build_data_model, load_staging, merge_staging, ExtractJob, RateLimitPolicy, S3Storage,
    SlackNotifier, StravaClient,
};
use chrono::{NaiveDate, Utc};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Exit code for a malformed validator invocation.
pub const EXIT_BAD_ARGS: i32 = -1;

/// Weekly Strava ELT pipeline.
#[derive(Parser, Debug)]
#[command(name = "strava-elt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline steps, in the order the scheduler runs them.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract new activities from Strava and upload the export file to S3
    Extract {
        /// Run date used in the export file name (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Copy the export file from S3 into the Redshift staging table
    Stage {
        /// Run date of the export file to load (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Compare the results of two SQL scripts
    Validate(CheckArgs),

    /// Upsert the staging table into production and drop it
    Merge,

    /// Rebuild the monthly data model
    BuildModel {
        /// SQL script to execute
        #[arg(long, default_value = DEFAULT_MODEL_SCRIPT)]
        script: PathBuf,
    },
}

/// Arguments of a validation check.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Script producing the first value
    pub script_1: PathBuf,

    /// Script producing the second value
    pub script_2: PathBuf,

    /// equals, greater_equals, greater, less_equals, less or not_equal
    pub operator: String,

    /// `halt` makes a failed check exit with 1; anything else exits with 0
    pub severity: String,
}

impl CheckArgs {
    pub fn into_check(self) -> ValidationCheck {
        ValidationCheck {
            operator: Operator::parse(&self.operator),
            severity: Severity::parse(&self.severity),
            script_1: self.script_1,
            script_2: self.script_2,
        }
    }
}

/// `validator <script1.sql> <script2.sql> <operator> <severity>`
#[derive(Parser, Debug)]
#[command(name = "validator", disable_version_flag = true, disable_help_flag = true)]
#[command(about = "Compare the results of two SQL scripts against the warehouse")]
pub struct ValidatorCli {
    #[command(flatten)]
    pub check: CheckArgs,
}

/// What the validator binary should do with its arguments.
#[derive(Debug)]
pub enum ValidatorInvocation {
    /// `-h`: print and exit 0
    Help(String),
    /// Wrong arguments: print and exit with `EXIT_BAD_ARGS`
    Usage(String),
    Run(ValidationCheck),
}

/// Parse validator arguments (including the program name).
///
/// `-h` prints help only as the sole argument; anywhere else it is a bad
/// argument like any other unknown flag.
pub fn parse_validator_args<I, T>(args: I) -> ValidatorInvocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() == 2 && args[1] == "-h" {
        let help = ValidatorCli::command().render_help().to_string();
        return ValidatorInvocation::Help(help);
    }

    match ValidatorCli::try_parse_from(args) {
        Ok(cli) => ValidatorInvocation::Run(cli.check.into_check()),
        Err(e) => ValidatorInvocation::Usage(e.to_string()),
    }
}

/// Run a parsed command. Returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Extract { date } => {
            let run_date = date.unwrap_or_else(|| Utc::now().date_naive());
            extract(run_date).await?;
            Ok(0)
        }
        Command::Stage { date } => {
            let run_date = date.unwrap_or_else(|| Utc::now().date_naive());
            stage(run_date).await?;
            Ok(0)
        }
        Command::Validate(args) => validate(args.into_check()).await,
        Command::Merge => {
            let config = WarehouseConfig::from_env()?;
            let warehouse = RedshiftWarehouse::connect(&config).await?;
            merge_staging(&warehouse, &config.table_name).await?;
            Ok(0)
        }
        Command::BuildModel { script } => {
            let config = WarehouseConfig::from_env()?;
            let warehouse = RedshiftWarehouse::connect(&config).await?;
            build_data_model(&warehouse, &script).await?;
            Ok(0)
        }
    }
}

async fn extract(run_date: NaiveDate) -> Result<()> {
    let strava_config = StravaConfig::from_env()?;
    let metadata_config = MetadataStoreConfig::from_env()?;
    let storage_config = ObjectStoreConfig::from_env()?;
    let export = ExportConfig::from_env();

    let client = StravaClient::new(&strava_config);
    let watermarks = MySqlWatermarkStore::connect(&metadata_config).await?;
    let storage = S3Storage::new(&storage_config);

    let job = ExtractJob {
        client: &client,
        refresh_token: &strava_config.refresh_token,
        watermarks: &watermarks,
        storage: &storage,
        export: &export,
        policy: RateLimitPolicy::default(),
    };
    let summary = job.run(run_date).await?;

    tracing::info!(
        rows = summary.rows,
        uri = %summary.uri,
        "Extract step complete"
    );
    Ok(())
}

async fn stage(run_date: NaiveDate) -> Result<()> {
    let config = WarehouseConfig::from_env()?;
    let storage_config = ObjectStoreConfig::from_env()?;
    let role_arn = config.role_arn()?;
    let source_uri = s3_uri(&storage_config.bucket, &export_key(run_date));

    let warehouse = RedshiftWarehouse::connect(&config).await?;
    load_staging(&warehouse, &config.table_name, &source_uri, &role_arn).await
}

/// Run a validation check and return its exit code.
pub async fn validate(check: ValidationCheck) -> Result<i32> {
    let config = WarehouseConfig::from_env()?;
    let notifier = SlackNotifier::new(&NotifyConfig::from_env());
    let warehouse = RedshiftWarehouse::connect(&config).await?;

    let report = check.run(&warehouse, &notifier).await?;
    println!("Result of test: {}", report.outcome.passed);
    Ok(report.exit_code)
}
