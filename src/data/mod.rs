//! Data module - CSV loading and row validation

mod loader;
mod records;
mod schema;
mod validator;

pub use loader::{DataLoader, LoaderError, POPULATION_FILE};
pub use records::{BirthRecord, Outcome, PopulationEntry, Sex, UNKNOWN_REGION};
pub use schema::{BirthColumns, PopulationColumns};
pub use validator::{validate_births, validate_population, RowError, ValidationSummary};
