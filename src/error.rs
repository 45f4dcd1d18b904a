//! Error taxonomy for the flow pipeline.
//!
//! Everything in [`FlowError`] is fatal: the run stops before any geometry is
//! built and no output file is written. Non-fatal findings travel as
//! [`crate::aggregate::DataQualityWarning`] next to a valid result instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    /// The ridership source is missing, unreadable or lacks a required column.
    #[error("cannot ingest ridership source '{origin}': {detail}")]
    Ingestion { origin: String, detail: String },

    /// A field in an otherwise readable row could not be interpreted.
    #[error("row {row}, column '{column}': cannot parse {value:?} as {expected}")]
    DataFormat {
        row: u64,
        column: String,
        value: String,
        expected: &'static str,
    },

    /// Summing a month's weekly rows left the `i64` range.
    #[error("row {row}: {measure} for {direction} {month} overflows")]
    CountOverflow {
        row: u64,
        month: String,
        direction: String,
        measure: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A band polygon failed validation (mismatched lengths, crossed edges, ...).
    #[error("invalid band polygon: {0}")]
    Geometry(String),
}

impl FlowError {
    pub fn ingestion(origin: &str, detail: impl ToString) -> Self {
        FlowError::Ingestion {
            origin: origin.to_string(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
