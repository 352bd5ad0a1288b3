//! Pipeline Module
//! Runs load → validate → aggregate → write for a single year.

use crate::config::{AggregateOptions, PipelineConfig, SexDenominator};
use crate::data::{
    validate_births, validate_population, BirthColumns, DataLoader, LoaderError,
    PopulationColumns, ValidationSummary,
};
use crate::report::{remove_report, write_report, WriterError};
use crate::stats::{AggregateError, BirthAggregator, Grouping, PopulationIndex, Report};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Writer(#[from] WriterError),
    #[error("{} report(s) failed: {}", .0.len(), join_errors(.0))]
    ReportsFailed(Vec<AggregateError>),
}

fn join_errors(errors: &[AggregateError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// In-memory result of processing one year.
#[derive(Debug)]
pub struct YearReports {
    pub year: i32,
    pub births: ValidationSummary,
    pub population: ValidationSummary,
    pub reports: Vec<(Grouping, Result<Report, AggregateError>)>,
}

impl YearReports {
    /// The report for `grouping`, if it aggregated successfully.
    pub fn report(&self, grouping: Grouping) -> Option<&Report> {
        self.reports
            .iter()
            .find(|(g, _)| *g == grouping)
            .and_then(|(_, r)| r.as_ref().ok())
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub year: i32,
    pub births: ValidationSummary,
    pub population: ValidationSummary,
    pub outputs: Vec<PathBuf>,
}

/// Validate and aggregate already-loaded tables.
pub fn process(
    births_df: &DataFrame,
    births_name: &str,
    population_df: &DataFrame,
    population_name: &str,
    year: i32,
    options: &AggregateOptions,
) -> Result<YearReports, LoaderError> {
    let birth_columns = BirthColumns::resolve(births_df, births_name)?;
    let population_columns = PopulationColumns::resolve(population_df, population_name)?;

    if options.sex_denominator == SexDenominator::SameSex && population_columns.sex.is_none() {
        return Err(LoaderError::SchemaError {
            file: population_name.to_string(),
            columns: vec!["sex".to_string()],
        });
    }

    let (records, births) = validate_births(births_df, &birth_columns, year)?;
    let (entries, population) = validate_population(population_df, &population_columns)?;

    let index = PopulationIndex::for_year(&entries, year);
    if index.is_empty() {
        warn!("{}: no population entries for {}", population_name, year);
    } else {
        info!("{} population entries for {}", index.len(), year);
    }

    let reports = BirthAggregator::aggregate_all(&records, &index, options);

    Ok(YearReports {
        year,
        births,
        population,
        reports,
    })
}

/// Run the whole pipeline for `config.year`.
///
/// Successful reports are written even when another report fails; the run
/// then returns [`PipelineError::ReportsFailed`]. A failed report's file from
/// an earlier run is removed so `out_dir` only holds this run's output.
pub fn run(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    info!("Processing births for {}", config.year);

    let loader = DataLoader::new(&config.data_dir)
        .with_births_file(config.births_file.clone())
        .with_population_file(config.population_file.clone());

    let (births_path, births_df) = loader.load_births(config.year)?;
    let (population_path, population_df) = loader.load_population()?;

    let processed = process(
        &births_df,
        &births_path.display().to_string(),
        &population_df,
        &population_path.display().to_string(),
        config.year,
        &config.aggregate,
    )?;

    let mut outputs = Vec::new();
    let mut failures = Vec::new();
    for (grouping, result) in processed.reports {
        match result {
            Ok(report) => {
                outputs.push(write_report(&report, &config.out_dir, config.rate_precision)?)
            }
            Err(err) => {
                error!("{} report not written: {}", grouping, err);
                remove_report(&config.out_dir, config.year, grouping)?;
                failures.push(err);
            }
        }
    }

    if !failures.is_empty() {
        return Err(PipelineError::ReportsFailed(failures));
    }

    Ok(RunSummary {
        year: processed.year,
        births: processed.births,
        population: processed.population,
        outputs,
    })
}
