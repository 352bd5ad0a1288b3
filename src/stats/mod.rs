//! Stats module - grouping, population lookup and birth rates

mod aggregator;
mod population;

pub use aggregator::{
    birth_rate, AggregateError, AggregateRow, BirthAggregator, BirthCounts, GroupKey, Grouping,
    Report,
};
pub use population::PopulationIndex;
