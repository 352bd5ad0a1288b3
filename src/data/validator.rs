//! Row Validator Module
//! Turns raw string rows into typed records, skipping and tallying bad rows.

use super::loader::{string_values, LoaderError};
use super::records::{
    normalize_region, parse_population, parse_year, BirthRecord, Outcome, PopulationEntry, Sex,
    UNKNOWN_REGION,
};
use super::schema::{BirthColumns, PopulationColumns};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

const AGGREGATE_SEX_LABELS: &[&str] = &["", "all", "total", "persons", "all persons", "0"];
const AGGREGATE_REGION_LABELS: &[&str] = &["", "all", "total", "all regions"];
const AGGREGATE_AGE_LABELS: &[&str] = &["", "all", "total", "all ages"];

/// Why a single row was skipped. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("missing value for {0}")]
    MissingField(&'static str),
    #[error("year {0:?} is not an integer")]
    InvalidYear(String),
    #[error("year {found} does not match requested year {expected}")]
    YearMismatch { expected: i32, found: i32 },
    #[error("unrecognised birth type {0:?}")]
    InvalidOutcome(String),
    #[error("unrecognised sex code {0:?}")]
    InvalidSex(String),
    #[error("population {0:?} is not a non-negative whole number")]
    InvalidPopulation(String),
}

impl RowError {
    /// Stable tally key.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::MissingField(_) => "missing_field",
            RowError::InvalidYear(_) => "invalid_year",
            RowError::YearMismatch { .. } => "year_mismatch",
            RowError::InvalidOutcome(_) => "invalid_outcome",
            RowError::InvalidSex(_) => "invalid_sex",
            RowError::InvalidPopulation(_) => "invalid_population",
        }
    }
}

/// Per-table validation tally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub table: String,
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rows_rejected: BTreeMap<String, usize>,
    /// Accepted rows whose sex code was not recognised.
    pub unrecognised_sex: usize,
}

impl ValidationSummary {
    fn new(table: &str, rows_read: usize) -> Self {
        Self {
            table: table.to_string(),
            rows_read,
            ..Default::default()
        }
    }

    fn reject(&mut self, row: usize, err: &RowError) {
        debug!("{}: skipping row {}: {}", self.table, row + 1, err);
        *self.rows_rejected.entry(err.kind().to_string()).or_insert(0) += 1;
    }

    pub fn total_rejected(&self) -> usize {
        self.rows_rejected.values().sum()
    }

    fn log(&self) {
        info!(
            "{}: {} of {} rows accepted",
            self.table, self.rows_accepted, self.rows_read
        );
        if self.total_rejected() > 0 {
            warn!(
                "{}: skipped {} invalid rows {:?}",
                self.table,
                self.total_rejected(),
                self.rows_rejected
            );
        }
        if self.unrecognised_sex > 0 {
            warn!(
                "{}: {} rows with unrecognised sex code kept out of sex breakdowns",
                self.table, self.unrecognised_sex
            );
        }
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, RowError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RowError::MissingField(field)),
    }
}

fn column_or_nulls(
    df: &DataFrame,
    column: Option<&String>,
) -> Result<Vec<Option<String>>, LoaderError> {
    match column {
        Some(name) => string_values(df, name),
        None => Ok(vec![None; df.height()]),
    }
}

fn is_label(value: &str, labels: &[&str]) -> bool {
    labels.iter().any(|l| value.eq_ignore_ascii_case(l))
}

/// Validate one births row.
fn birth_row(
    year: &Option<String>,
    outcome: &Option<String>,
    sex: &Option<String>,
    region: &Option<String>,
    expected_year: i32,
) -> Result<BirthRecord, RowError> {
    let raw_year = required(year, "year")?;
    let found = parse_year(raw_year).ok_or_else(|| RowError::InvalidYear(raw_year.to_string()))?;
    if found != expected_year {
        return Err(RowError::YearMismatch {
            expected: expected_year,
            found,
        });
    }

    let raw_outcome = required(outcome, "birth_type")?;
    let outcome = Outcome::parse(raw_outcome)
        .ok_or_else(|| RowError::InvalidOutcome(raw_outcome.to_string()))?;

    Ok(BirthRecord {
        year: found,
        sex: sex.as_deref().and_then(Sex::parse),
        region: normalize_region(region.as_deref()),
        outcome,
    })
}

/// Validate every row of the births table for `year`.
pub fn validate_births(
    df: &DataFrame,
    columns: &BirthColumns,
    year: i32,
) -> Result<(Vec<BirthRecord>, ValidationSummary), LoaderError> {
    let years = string_values(df, &columns.year)?;
    let outcomes = string_values(df, &columns.outcome)?;
    let sexes = string_values(df, &columns.sex)?;
    let regions = string_values(df, &columns.region)?;

    let mut summary = ValidationSummary::new("births", df.height());
    let mut records = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        match birth_row(&years[i], &outcomes[i], &sexes[i], &regions[i], year) {
            Ok(record) => {
                if record.sex.is_none() {
                    summary.unrecognised_sex += 1;
                }
                records.push(record);
            }
            Err(err) => summary.reject(i, &err),
        }
    }

    summary.rows_accepted = records.len();
    summary.log();
    Ok((records, summary))
}

/// Validate one population row.
fn population_row(
    year: &Option<String>,
    population: &Option<String>,
    sex: &Option<String>,
    region: &Option<String>,
    age: &Option<String>,
) -> Result<PopulationEntry, RowError> {
    let raw_year = required(year, "year")?;
    let year = parse_year(raw_year).ok_or_else(|| RowError::InvalidYear(raw_year.to_string()))?;

    let raw_population = required(population, "population")?;
    let population = parse_population(raw_population)
        .ok_or_else(|| RowError::InvalidPopulation(raw_population.to_string()))?;

    let sex_value = sex.as_deref().map(str::trim).unwrap_or("");
    let sex = if is_label(sex_value, AGGREGATE_SEX_LABELS) {
        None
    } else {
        Some(Sex::parse(sex_value).ok_or_else(|| RowError::InvalidSex(sex_value.to_string()))?)
    };

    let region_value = region.as_deref().map(str::trim).unwrap_or("");
    let region = if is_label(region_value, AGGREGATE_REGION_LABELS) {
        None
    } else if region_value.eq_ignore_ascii_case("na") {
        Some(UNKNOWN_REGION.to_string())
    } else {
        Some(region_value.to_string())
    };

    let age_value = age.as_deref().map(str::trim).unwrap_or("");
    let age = if is_label(age_value, AGGREGATE_AGE_LABELS) {
        None
    } else {
        Some(age_value.to_string())
    };

    Ok(PopulationEntry {
        year,
        sex,
        region,
        age,
        population,
    })
}

/// Validate every row of the population table. Rows for all years are kept.
pub fn validate_population(
    df: &DataFrame,
    columns: &PopulationColumns,
) -> Result<(Vec<PopulationEntry>, ValidationSummary), LoaderError> {
    let years = string_values(df, &columns.year)?;
    let populations = string_values(df, &columns.population)?;
    let sexes = column_or_nulls(df, columns.sex.as_ref())?;
    let regions = column_or_nulls(df, columns.region.as_ref())?;
    let ages = column_or_nulls(df, columns.age.as_ref())?;

    let mut summary = ValidationSummary::new("population", df.height());
    let mut entries = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        match population_row(&years[i], &populations[i], &sexes[i], &regions[i], &ages[i]) {
            Ok(entry) => entries.push(entry),
            Err(err) => summary.reject(i, &err),
        }
    }

    summary.rows_accepted = entries.len();
    summary.log();
    Ok((entries, summary))
}
