//! Births Report - yearly birth-record aggregation & birth-rate reports
//!
//! Reads `data_YYYY.csv` and `pop_data.csv`, validates the rows and writes
//! totals, by-sex, by-region and by-sex-and-region reports with live births
//! per 1,000 population.

pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::{AggregateOptions, MissingPopulation, PipelineConfig, SexDenominator};
pub use pipeline::{process, run, PipelineError, RunSummary, YearReports};
