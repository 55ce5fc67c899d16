//! Error types for the shift-offer reporting pipeline.
//!
//! Row-level dirt never produces an error: the normalizer degrades bad values
//! to null. Only configuration mistakes and I/O failures are surfaced here.

use thiserror::Error;

/// A query or report was configured with something that cannot be honored.
///
/// These are raised before any aggregation work begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The name does not match any column of the shift-offer schema.
    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    /// The field exists but cannot be summed.
    #[error("field '{field}' is not numeric and cannot be used as a metric")]
    NotNumeric { field: String },

    /// The field exists but is not a boolean flag.
    #[error("field '{name}' is not a boolean flag")]
    UnknownFlag { name: String },

    /// Period tokens are `week`, `month` or `year`.
    #[error("invalid period '{token}' (expected week, month or year)")]
    InvalidPeriod { token: String },

    #[error("top-N must be a positive integer, got '{value}'")]
    InvalidTopN { value: String },

    #[error("histogram needs at least one bin")]
    InvalidBinCount,
}

/// Errors raised while loading input or writing report artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
