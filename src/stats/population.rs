//! Population Index Module
//! Population denominators for one year, summed at whatever level a report needs.

use crate::data::{PopulationEntry, Sex};
use std::collections::BTreeMap;

/// A breakdown dimension of the population table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dim {
    Sex,
    Region,
    Age,
}

impl Dim {
    /// The entry's value on this dimension, `None` for an aggregate row.
    fn value(self, entry: &PopulationEntry) -> Option<&str> {
        match self {
            Dim::Sex => entry.sex.map(|s| s.label()),
            Dim::Region => entry.region.as_deref(),
            Dim::Age => entry.age.as_deref(),
        }
    }
}

/// Population of `rows` summed over the unconstrained `dims`.
///
/// Rows aggregate on every remaining dimension win outright. Otherwise the
/// rows are split on a dimension with no aggregate rows and each slice is
/// resolved on its own, so partial totals only stand in for the slice they
/// cover.
fn resolve(rows: &[&PopulationEntry], dims: &[Dim]) -> Option<u64> {
    if rows.is_empty() {
        return None;
    }
    let sum = |rows: &[&PopulationEntry]| {
        rows.iter().fold(0u64, |acc, e| acc.saturating_add(e.population))
    };
    if dims.is_empty() {
        return Some(sum(rows));
    }

    let totals: Vec<&PopulationEntry> = rows
        .iter()
        .copied()
        .filter(|e| dims.iter().all(|d| d.value(e).is_none()))
        .collect();
    if !totals.is_empty() {
        return Some(sum(&totals));
    }

    let split = dims
        .iter()
        .position(|d| rows.iter().all(|e| d.value(e).is_some()));
    let Some(pos) = split else {
        // every dimension has some aggregate rows: narrow to the first one's
        let dim = dims[0];
        let narrowed: Vec<&PopulationEntry> = rows
            .iter()
            .copied()
            .filter(|e| dim.value(e).is_none())
            .collect();
        return resolve(&narrowed, &dims[1..]);
    };

    let dim = dims[pos];
    let rest: Vec<Dim> = dims.iter().copied().filter(|d| *d != dim).collect();
    let mut slices: BTreeMap<&str, Vec<&PopulationEntry>> = BTreeMap::new();
    for &entry in rows {
        if let Some(value) = dim.value(entry) {
            slices.entry(value).or_default().push(entry);
        }
    }

    slices
        .values()
        .map(|slice| resolve(slice, &rest))
        .try_fold(0u64, |acc, p| p.map(|p| acc.saturating_add(p)))
}

/// Population entries for a single year.
#[derive(Debug, Clone, Default)]
pub struct PopulationIndex {
    year: i32,
    entries: Vec<PopulationEntry>,
}

impl PopulationIndex {
    /// Keep the entries belonging to `year`.
    pub fn for_year(entries: &[PopulationEntry], year: i32) -> Self {
        Self {
            year,
            entries: entries.iter().filter(|e| e.year == year).cloned().collect(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Population for a sex/region slice, `None` meaning "any" on that dimension.
    ///
    /// Constrained dimensions match exactly. Unconstrained ones prefer the
    /// table's own aggregate rows and fall back to summing the detailed rows
    /// slice by slice, so a table mixing totals and breakdowns is never double
    /// counted. Age is always unconstrained.
    pub fn lookup(&self, sex: Option<Sex>, region: Option<&str>) -> Option<u64> {
        let rows: Vec<&PopulationEntry> = self
            .entries
            .iter()
            .filter(|e| sex.map_or(true, |s| e.sex == Some(s)))
            .filter(|e| region.map_or(true, |r| e.region.as_deref() == Some(r)))
            .collect();

        let mut dims = Vec::with_capacity(3);
        if sex.is_none() {
            dims.push(Dim::Sex);
        }
        if region.is_none() {
            dims.push(Dim::Region);
        }
        dims.push(Dim::Age);

        resolve(&rows, &dims)
    }

    /// Whole-year population.
    pub fn total(&self) -> Option<u64> {
        self.lookup(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        sex: Option<Sex>,
        region: Option<&str>,
        age: Option<&str>,
        population: u64,
    ) -> PopulationEntry {
        PopulationEntry {
            year: 2023,
            sex,
            region: region.map(str::to_string),
            age: age.map(str::to_string),
            population,
        }
    }

    #[test]
    fn sums_detail_rows_when_no_totals() {
        let entries = vec![
            entry(Some(Sex::Male), Some("North"), Some("0-14"), 100),
            entry(Some(Sex::Male), Some("North"), Some("15-44"), 200),
            entry(Some(Sex::Female), Some("North"), Some("15-44"), 300),
            entry(Some(Sex::Female), Some("South"), Some("15-44"), 400),
        ];
        let index = PopulationIndex::for_year(&entries, 2023);

        assert_eq!(index.total(), Some(1000));
        assert_eq!(index.lookup(None, Some("North")), Some(600));
        assert_eq!(index.lookup(Some(Sex::Male), None), Some(300));
        assert_eq!(index.lookup(Some(Sex::Female), Some("South")), Some(400));
        assert_eq!(index.lookup(Some(Sex::Male), Some("South")), None);
        assert_eq!(index.lookup(None, Some("East")), None);
    }

    #[test]
    fn prefers_aggregate_rows_over_breakdowns() {
        let entries = vec![
            entry(None, None, None, 5000),
            entry(None, Some("North"), None, 2000),
            entry(None, Some("South"), None, 3000),
            entry(Some(Sex::Male), Some("North"), None, 900),
            entry(Some(Sex::Female), Some("North"), None, 1100),
        ];
        let index = PopulationIndex::for_year(&entries, 2023);

        assert_eq!(index.total(), Some(5000));
        assert_eq!(index.lookup(None, Some("North")), Some(2000));
        assert_eq!(index.lookup(Some(Sex::Female), None), Some(1100));
    }

    #[test]
    fn partial_totals_cover_only_their_slice() {
        let entries = vec![
            entry(None, Some("North"), None, 2000),
            entry(Some(Sex::Male), Some("South"), None, 1500),
            entry(Some(Sex::Female), Some("South"), None, 1500),
        ];
        let index = PopulationIndex::for_year(&entries, 2023);

        assert_eq!(index.total(), Some(5000));
        assert_eq!(index.lookup(None, Some("North")), Some(2000));
        assert_eq!(index.lookup(None, Some("South")), Some(3000));
        assert_eq!(index.lookup(Some(Sex::Male), None), Some(1500));
    }

    #[test]
    fn region_totals_beside_sex_breakdowns() {
        let entries = vec![
            entry(None, Some("North"), None, 2000),
            entry(Some(Sex::Male), Some("North"), None, 900),
            entry(Some(Sex::Female), Some("North"), None, 1100),
            entry(Some(Sex::Male), Some("South"), Some("0-14"), 700),
            entry(Some(Sex::Male), Some("South"), Some("15-44"), 800),
            entry(Some(Sex::Female), Some("South"), None, 1500),
        ];
        let index = PopulationIndex::for_year(&entries, 2023);

        assert_eq!(index.total(), Some(5000));
        assert_eq!(index.lookup(Some(Sex::Male), Some("South")), Some(1500));
    }

    #[test]
    fn other_years_are_ignored() {
        let mut other = entry(None, None, None, 42);
        other.year = 2022;
        let index = PopulationIndex::for_year(&[other], 2023);
        assert!(index.is_empty());
        assert_eq!(index.total(), None);
    }
}
