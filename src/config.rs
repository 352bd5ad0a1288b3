//! Run configuration shared by the pipeline and the command line.

use clap::ValueEnum;
use std::path::PathBuf;

/// Births per this many population.
pub const RATE_SCALE: f64 = 1000.0;

/// Decimal places kept in the `birth_rate` column unless configured otherwise.
pub const DEFAULT_RATE_PRECISION: u8 = 4;

/// Most decimal places an `f64` rate can be rounded to meaningfully.
pub const MAX_RATE_PRECISION: u8 = 15;

/// Denominator used for sex-bearing reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SexDenominator {
    /// Whole population of the group's region (or of the year).
    #[default]
    AllPersons,
    /// Population of the same sex only; needs a `sex` column in the population table.
    SameSex,
}

/// What to do when a group has no matching population entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MissingPopulation {
    /// Fail the report.
    #[default]
    Fail,
    /// Emit the row with blank population and birth rate.
    Blank,
}

/// Options that shape aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub sex_denominator: SexDenominator,
    pub missing_population: MissingPopulation,
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub year: i32,
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub births_file: Option<PathBuf>,
    pub population_file: Option<PathBuf>,
    /// `None` writes rates at full precision.
    pub rate_precision: Option<u8>,
    pub aggregate: AggregateOptions,
}

impl PipelineConfig {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year: 0,
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("outputs"),
            births_file: None,
            population_file: None,
            rate_precision: Some(DEFAULT_RATE_PRECISION),
            aggregate: AggregateOptions::default(),
        }
    }
}
