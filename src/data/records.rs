//! Record Types Module
//! Validated birth and population rows plus the code tables used to parse them.

use std::fmt;

/// Region label used when a birth record carries no usable region.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Sex of the child (or of the population slice).
///
/// Ordering follows the label so report rows sort Female before Male.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    /// Parse a sex code. Accepts `1`/`M`/`Male` and `2`/`F`/`Female`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "m" | "male" => Some(Sex::Male),
            "2" | "f" | "female" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Birth outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Live,
    Still,
}

impl Outcome {
    /// Parse a birth type such as `Live birth`, `Stillbirth`, `L` or `S`.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim().to_ascii_lowercase();
        match value.as_str() {
            "s" => return Some(Outcome::Still),
            "l" => return Some(Outcome::Live),
            _ => {}
        }

        if value.contains("still") {
            Some(Outcome::Still)
        } else if value.contains("live") {
            Some(Outcome::Live)
        } else {
            None
        }
    }
}

/// One validated birth event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthRecord {
    pub year: i32,
    /// `None` when the sex code was not recognised.
    pub sex: Option<Sex>,
    pub region: String,
    pub outcome: Outcome,
}

/// One validated population row.
///
/// `None` in a dimension means the row is an aggregate over that dimension
/// ("all persons", "all regions", "all ages").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationEntry {
    pub year: i32,
    pub sex: Option<Sex>,
    pub region: Option<String>,
    pub age: Option<String>,
    pub population: u64,
}

/// Normalise a birth record's region: blank or `NA` becomes `Unknown`.
pub fn normalize_region(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") => UNKNOWN_REGION.to_string(),
        Some(value) if value.eq_ignore_ascii_case("na") => UNKNOWN_REGION.to_string(),
        Some(value) => value.to_string(),
    }
}

/// Parse an integral year, tolerating a trailing `.0` from float-typed exports.
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

/// Parse a non-negative integral population count (`5000` or `5000.0`).
pub fn parse_population(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(count) = raw.parse::<u64>() {
        return Some(count);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}
