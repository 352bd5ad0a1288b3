//! Births Report - command line entry point
//!
//! Processes one year of birth records and writes the four summary reports.

use anyhow::{Context, Result};
use births_report::config::{DEFAULT_RATE_PRECISION, MAX_RATE_PRECISION};
use births_report::{AggregateOptions, MissingPopulation, PipelineConfig, SexDenominator};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "births-report")]
#[command(about = "Aggregate yearly birth records into birth-rate reports")]
#[command(version)]
struct Args {
    /// Year to process, e.g. 2024
    #[arg(short, long)]
    year: i32,

    /// Directory for the CSV outputs
    #[arg(long, default_value = "outputs", env = "BIRTHS_OUT_DIR")]
    out_dir: PathBuf,

    /// Directory holding data_YYYY.csv and pop_data.csv
    #[arg(long, default_value = "data", env = "BIRTHS_DATA_DIR")]
    data_dir: PathBuf,

    /// Explicit births file (skips the data directory search)
    #[arg(long)]
    births_file: Option<PathBuf>,

    /// Explicit population file
    #[arg(long)]
    population_file: Option<PathBuf>,

    /// Decimal places in the birth_rate column
    #[arg(
        long,
        default_value_t = DEFAULT_RATE_PRECISION,
        value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_RATE_PRECISION))
    )]
    rate_precision: u8,

    /// Population used as denominator for sex breakdowns
    #[arg(long, value_enum, default_value_t = SexDenominator::AllPersons)]
    sex_denominator: SexDenominator,

    /// Behaviour when a group has no population entry
    #[arg(long, value_enum, default_value_t = MissingPopulation::Fail)]
    missing_population: MissingPopulation,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        Self {
            year: args.year,
            data_dir: args.data_dir,
            out_dir: args.out_dir,
            births_file: args.births_file,
            population_file: args.population_file,
            rate_precision: Some(args.rate_precision),
            aggregate: AggregateOptions {
                sex_denominator: args.sex_denominator,
                missing_population: args.missing_population,
            },
        }
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let json = args.json;
    let config = PipelineConfig::from(args);

    let summary = births_report::run(&config)
        .with_context(|| format!("Births pipeline failed for {}", config.year))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("{} reports written", summary.outputs.len());
        println!("Wrote outputs to {}", config.out_dir.display());
    }

    Ok(())
}
