//! Column Schema Module
//! Maps canonical field names onto the headers actually present in a file.

use super::loader::{column_names, find_column, LoaderError};
use polars::prelude::DataFrame;

const YEAR_ALIASES: &[&str] = &["year", "dobyr"];
const OUTCOME_ALIASES: &[&str] = &["birth_type", "btype", "outcome"];
const SEX_ALIASES: &[&str] = &["sex"];
const REGION_ALIASES: &[&str] = &["region", "place_of_birth"];
const POP_REGION_ALIASES: &[&str] = &["region", "geography"];
const AGE_ALIASES: &[&str] = &["age"];
const POPULATION_ALIASES: &[&str] = &["population"];

/// Resolved headers of a births table.
#[derive(Debug, Clone)]
pub struct BirthColumns {
    pub year: String,
    pub outcome: String,
    pub sex: String,
    pub region: String,
}

impl BirthColumns {
    /// Resolve the four required births columns; all of them must be present.
    pub fn resolve(df: &DataFrame, file: &str) -> Result<Self, LoaderError> {
        let headers = column_names(df);
        let mut missing = Vec::new();
        let mut require = |name: &str, aliases: &[&str]| {
            let found = find_column(&headers, aliases);
            if found.is_none() {
                missing.push(name.to_string());
            }
            found.unwrap_or_default()
        };

        let year = require("year", YEAR_ALIASES);
        let outcome = require("birth_type", OUTCOME_ALIASES);
        let sex = require("sex", SEX_ALIASES);
        let region = require("region", REGION_ALIASES);

        if !missing.is_empty() {
            missing.sort();
            return Err(LoaderError::SchemaError {
                file: file.to_string(),
                columns: missing,
            });
        }

        Ok(Self {
            year,
            outcome,
            sex,
            region,
        })
    }
}

/// Resolved headers of a population table. Only year and population are required.
#[derive(Debug, Clone)]
pub struct PopulationColumns {
    pub year: String,
    pub population: String,
    pub sex: Option<String>,
    pub region: Option<String>,
    pub age: Option<String>,
}

impl PopulationColumns {
    pub fn resolve(df: &DataFrame, file: &str) -> Result<Self, LoaderError> {
        let headers = column_names(df);
        let year = find_column(&headers, YEAR_ALIASES);
        let population = find_column(&headers, POPULATION_ALIASES);

        match (year, population) {
            (Some(year), Some(population)) => Ok(Self {
                year,
                population,
                sex: find_column(&headers, SEX_ALIASES),
                region: find_column(&headers, POP_REGION_ALIASES),
                age: find_column(&headers, AGE_ALIASES),
            }),
            (year, population) => {
                let mut columns = Vec::new();
                if population.is_none() {
                    columns.push("population".to_string());
                }
                if year.is_none() {
                    columns.push("year".to_string());
                }
                Err(LoaderError::SchemaError {
                    file: file.to_string(),
                    columns,
                })
            }
        }
    }
}
