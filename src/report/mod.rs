//! Report module - CSV output

mod writer;

pub use writer::{
    remove_report, report_file_name, report_to_dataframe, write_report, WriterError,
};
