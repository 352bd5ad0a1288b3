//! CSV Data Loader Module
//! Locates the yearly input files and loads them with Polars.

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the population reference table inside the data directory.
pub const POPULATION_FILE: &str = "pop_data.csv";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Missing input file: {0}")]
    MissingFile(String),
    #[error("{file} is missing required columns: {columns:?}")]
    SchemaError { file: String, columns: Vec<String> },
    #[error("{0} contains no data rows")]
    EmptyInput(String),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read data directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Finds and reads the births and population tables for a run.
pub struct DataLoader {
    data_dir: PathBuf,
    births_override: Option<PathBuf>,
    population_override: Option<PathBuf>,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            births_override: None,
            population_override: None,
        }
    }

    /// Use an explicit births file instead of searching the data directory.
    pub fn with_births_file(mut self, path: Option<PathBuf>) -> Self {
        self.births_override = path;
        self
    }

    /// Use an explicit population file instead of `data_dir/pop_data.csv`.
    pub fn with_population_file(mut self, path: Option<PathBuf>) -> Self {
        self.population_override = path;
        self
    }

    /// Locate the births file for `year`.
    ///
    /// Prefers `data_dir/data_{year}.csv`, then falls back to the first CSV
    /// (by name) in the data directory whose file name contains the year.
    pub fn locate_births(&self, year: i32) -> Result<PathBuf, LoaderError> {
        if let Some(path) = &self.births_override {
            return existing(path);
        }

        let preferred = self.data_dir.join(format!("data_{year}.csv"));
        if preferred.is_file() {
            return Ok(preferred);
        }

        let year_str = year.to_string();
        if self.data_dir.is_dir() {
            let mut candidates: Vec<PathBuf> = fs::read_dir(&self.data_dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    let is_csv = path
                        .extension()
                        .map(|ext| ext.eq_ignore_ascii_case("csv"))
                        .unwrap_or(false);
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    is_csv && name != POPULATION_FILE && name.contains(&year_str)
                })
                .collect();
            candidates.sort();

            if let Some(found) = candidates.into_iter().next() {
                debug!("Using fallback births file {}", found.display());
                return Ok(found);
            }
        }

        Err(LoaderError::MissingFile(format!(
            "no births CSV for year {year} in {}",
            self.data_dir.display()
        )))
    }

    /// Locate the population reference table.
    pub fn locate_population(&self) -> Result<PathBuf, LoaderError> {
        match &self.population_override {
            Some(path) => existing(path),
            None => existing(&self.data_dir.join(POPULATION_FILE)),
        }
    }

    /// Load a CSV file using Polars, reading every column as a string.
    pub fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        info!(
            "Loaded {} ({} rows, {} columns)",
            path.display(),
            df.height(),
            df.width()
        );
        Ok(df)
    }

    /// Locate and read the births table for `year`.
    pub fn load_births(&self, year: i32) -> Result<(PathBuf, DataFrame), LoaderError> {
        let path = self.locate_births(year)?;
        let df = Self::read_csv(&path)?;
        if df.height() == 0 {
            return Err(LoaderError::EmptyInput(path.display().to_string()));
        }
        Ok((path, df))
    }

    /// Locate and read the population table.
    pub fn load_population(&self) -> Result<(PathBuf, DataFrame), LoaderError> {
        let path = self.locate_population()?;
        let df = Self::read_csv(&path)?;
        if df.height() == 0 {
            return Err(LoaderError::EmptyInput(path.display().to_string()));
        }
        Ok((path, df))
    }
}

fn existing(path: &Path) -> Result<PathBuf, LoaderError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(LoaderError::MissingFile(path.display().to_string()))
    }
}

/// Get list of column names from a DataFrame.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Find the header matching any of `aliases` (trimmed, case-insensitive).
pub fn find_column(headers: &[String], aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .find(|h| h.trim().eq_ignore_ascii_case(alias))
            .cloned()
    })
}

/// Extract a column as optional strings, one per row.
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, LoaderError> {
    let series = df.column(column)?.cast(&DataType::String)?;
    let ca = series.str()?;
    Ok(ca
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}
