//! Report Writer Module
//! Renders reports to DataFrames and writes them as CSV files.

use crate::config::MAX_RATE_PRECISION;
use crate::stats::{Grouping, Report};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Failed to write report: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Output file name for a report, e.g. `2023_by_sex.csv`.
pub fn report_file_name(year: i32, grouping: Grouping) -> String {
    format!("{}_{}.csv", year, grouping.name())
}

/// Round to `precision` decimal places; beyond `MAX_RATE_PRECISION` the value is kept as is.
fn round_to(value: f64, precision: Option<u8>) -> f64 {
    match precision {
        Some(digits) if digits <= MAX_RATE_PRECISION => {
            let factor = 10f64.powi(i32::from(digits));
            (value * factor).round() / factor
        }
        _ => value,
    }
}

/// Convert a report to a DataFrame.
///
/// Columns: `[sex][, region], live_births, still_births, population, birth_rate`.
pub fn report_to_dataframe(
    report: &Report,
    precision: Option<u8>,
) -> Result<DataFrame, WriterError> {
    let mut columns: Vec<Column> = Vec::with_capacity(6);

    if report.grouping.has_sex() {
        let sexes: Vec<String> = report
            .rows
            .iter()
            .map(|r| r.key.sex.map(|s| s.to_string()).unwrap_or_default())
            .collect();
        columns.push(Column::new("sex".into(), sexes));
    }

    if report.grouping.has_region() {
        let regions: Vec<String> = report
            .rows
            .iter()
            .map(|r| r.key.region.clone().unwrap_or_default())
            .collect();
        columns.push(Column::new("region".into(), regions));
    }

    let live: Vec<u64> = report.rows.iter().map(|r| r.live_births).collect();
    let still: Vec<u64> = report.rows.iter().map(|r| r.still_births).collect();
    let population: Vec<Option<u64>> = report.rows.iter().map(|r| r.population).collect();
    let rates: Vec<Option<f64>> = report
        .rows
        .iter()
        .map(|r| r.birth_rate.map(|v| round_to(v, precision)))
        .collect();

    columns.push(Column::new("live_births".into(), live));
    columns.push(Column::new("still_births".into(), still));
    columns.push(Column::new("population".into(), population));
    columns.push(Column::new("birth_rate".into(), rates));

    Ok(DataFrame::new(columns)?)
}

/// Write one report into `out_dir`, creating the directory if needed.
pub fn write_report(
    report: &Report,
    out_dir: &Path,
    precision: Option<u8>,
) -> Result<PathBuf, WriterError> {
    fs::create_dir_all(out_dir).map_err(|source| WriterError::Io {
        path: out_dir.display().to_string(),
        source,
    })?;

    let path = out_dir.join(report_file_name(report.year, report.grouping));
    let mut df = report_to_dataframe(report, precision)?;
    let mut file = File::create(&path).map_err(|source| WriterError::Io {
        path: path.display().to_string(),
        source,
    })?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    info!("Wrote {} ({} rows)", path.display(), df.height());
    Ok(path)
}

/// Delete a report left in `out_dir` by an earlier run. Returns whether one existed.
pub fn remove_report(out_dir: &Path, year: i32, grouping: Grouping) -> Result<bool, WriterError> {
    let path = out_dir.join(report_file_name(year, grouping));
    if !path.is_file() {
        return Ok(false);
    }
    fs::remove_file(&path).map_err(|source| WriterError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Removed stale {}", path.display());
    Ok(true)
}
