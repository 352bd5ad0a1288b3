//! Birth Aggregator Module
//! Groups validated births, attaches population denominators and computes birth rates.

use super::population::PopulationIndex;
use crate::config::{AggregateOptions, MissingPopulation, SexDenominator, RATE_SCALE};
use crate::data::{BirthRecord, Outcome, Sex};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("{report}: no population entry for {key} in {year}")]
    PopulationLookup {
        report: &'static str,
        key: String,
        year: i32,
    },
}

/// The four report breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grouping {
    Totals,
    BySex,
    ByRegion,
    BySexRegion,
}

impl Grouping {
    pub const ALL: [Grouping; 4] = [
        Grouping::Totals,
        Grouping::BySex,
        Grouping::ByRegion,
        Grouping::BySexRegion,
    ];

    /// Report name, also the output file suffix.
    pub fn name(&self) -> &'static str {
        match self {
            Grouping::Totals => "totals",
            Grouping::BySex => "by_sex",
            Grouping::ByRegion => "by_region",
            Grouping::BySexRegion => "by_sex_region",
        }
    }

    pub fn has_sex(&self) -> bool {
        matches!(self, Grouping::BySex | Grouping::BySexRegion)
    }

    pub fn has_region(&self) -> bool {
        matches!(self, Grouping::ByRegion | Grouping::BySexRegion)
    }

    /// Grouping key for a record, or `None` when the record has no place in
    /// this breakdown (unrecognised sex in a sex grouping).
    fn key_for(&self, record: &BirthRecord) -> Option<GroupKey> {
        let sex = if self.has_sex() {
            Some(record.sex?)
        } else {
            None
        };
        let region = self.has_region().then(|| record.region.clone());
        Some(GroupKey { sex, region })
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grouping key of one output row. Both parts are `None` for totals.
///
/// Ordering sorts by sex first, then region.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub sex: Option<Sex>,
    pub region: Option<String>,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.sex, &self.region) {
            (None, None) => f.write_str("all births"),
            (Some(sex), None) => write!(f, "sex={sex}"),
            (None, Some(region)) => write!(f, "region={region}"),
            (Some(sex), Some(region)) => write!(f, "sex={sex}, region={region}"),
        }
    }
}

/// Live and still births in one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BirthCounts {
    pub live: u64,
    pub still: u64,
}

impl BirthCounts {
    fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Live => self.live += 1,
            Outcome::Still => self.still += 1,
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub live_births: u64,
    pub still_births: u64,
    /// `None` only when the population was missing and blanks were allowed.
    pub population: Option<u64>,
    /// `None` when the population is zero or missing.
    pub birth_rate: Option<f64>,
}

/// One finished breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub grouping: Grouping,
    pub year: i32,
    pub rows: Vec<AggregateRow>,
}

impl Report {
    pub fn live_births(&self) -> u64 {
        self.rows.iter().map(|r| r.live_births).sum()
    }

    pub fn still_births(&self) -> u64 {
        self.rows.iter().map(|r| r.still_births).sum()
    }
}

/// Live births per 1,000 population. Zero population yields `None`.
pub fn birth_rate(live_births: u64, population: u64) -> Option<f64> {
    if population == 0 {
        return None;
    }
    Some(live_births as f64 / population as f64 * RATE_SCALE)
}

/// Handles grouping and rate calculation for the yearly reports.
pub struct BirthAggregator;

impl BirthAggregator {
    /// Count live and still births per group, sorted by key.
    pub fn count_births(
        records: &[BirthRecord],
        grouping: Grouping,
    ) -> BTreeMap<GroupKey, BirthCounts> {
        let mut groups: BTreeMap<GroupKey, BirthCounts> = BTreeMap::new();

        // Totals always has its single row, even without records
        if grouping == Grouping::Totals {
            groups.insert(GroupKey::default(), BirthCounts::default());
        }

        for record in records {
            if let Some(key) = grouping.key_for(record) {
                groups.entry(key).or_default().add(record.outcome);
            }
        }

        groups
    }

    /// Population denominator for a group.
    fn population_for(
        key: &GroupKey,
        population: &PopulationIndex,
        options: &AggregateOptions,
    ) -> Option<u64> {
        let sex = match options.sex_denominator {
            SexDenominator::AllPersons => None,
            SexDenominator::SameSex => key.sex,
        };
        population.lookup(sex, key.region.as_deref())
    }

    /// Build one report.
    pub fn aggregate(
        records: &[BirthRecord],
        population: &PopulationIndex,
        grouping: Grouping,
        options: &AggregateOptions,
    ) -> Result<Report, AggregateError> {
        let counts = Self::count_births(records, grouping);
        let mut rows = Vec::with_capacity(counts.len());

        for (key, count) in counts {
            let pop = Self::population_for(&key, population, options);
            if pop.is_none() {
                match options.missing_population {
                    MissingPopulation::Fail => {
                        return Err(AggregateError::PopulationLookup {
                            report: grouping.name(),
                            key: key.to_string(),
                            year: population.year(),
                        });
                    }
                    MissingPopulation::Blank => {
                        warn!("{}: no population for {}, leaving rate blank", grouping, key);
                    }
                }
            }

            rows.push(AggregateRow {
                live_births: count.live,
                still_births: count.still,
                population: pop,
                birth_rate: pop.and_then(|p| birth_rate(count.live, p)),
                key,
            });
        }

        debug!("{}: {} groups", grouping, rows.len());
        Ok(Report {
            grouping,
            year: population.year(),
            rows,
        })
    }

    /// Build all four reports. A lookup failure only fails its own report.
    pub fn aggregate_all(
        records: &[BirthRecord],
        population: &PopulationIndex,
        options: &AggregateOptions,
    ) -> Vec<(Grouping, Result<Report, AggregateError>)> {
        Grouping::ALL
            .iter()
            .map(|&grouping| {
                (
                    grouping,
                    Self::aggregate(records, population, grouping, options),
                )
            })
            .collect()
    }
}
