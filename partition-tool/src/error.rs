use thiserror::Error;

/// Errors that can occur during CSV parsing, binary generation, or binary
/// parsing of partition tables.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    TableError(#[from] esp_partition_table::Error),

    #[error("line {line}: invalid partition type: {value}")]
    InvalidType { line: u64, value: String },

    #[error("line {line}: invalid subtype: {value}")]
    InvalidSubType { line: u64, value: String },

    #[error("line {line}: invalid name: {reason}")]
    InvalidName { line: u64, reason: String },

    #[error("line {line}: invalid {field}: {value}")]
    InvalidNumber {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: invalid flag: {value}")]
    InvalidFlag { line: u64, value: String },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}
