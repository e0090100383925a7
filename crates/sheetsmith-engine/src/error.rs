//! Error types for the addressing and style layer.

use thiserror::Error;

/// Errors raised while resolving addresses, ranges and style values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid cell reference: '{0}'")]
    InvalidReference(String),

    #[error("Invalid range {range}: {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("Range {range} shifted by ({row_offset}, {col_offset}) leaves the sheet")]
    OutOfBounds {
        range: String,
        row_offset: i64,
        col_offset: i64,
    },

    #[error("Invalid color '{0}': expected a hex triplet like #FF0000 or a named color")]
    InvalidColor(String),

    #[error(
        "Invalid alignment '{0}': expected one of left, center, right, top, middle, bottom, justify"
    )]
    InvalidAlignment(String),

    #[error("Invalid border style '{0}'")]
    InvalidBorderStyle(String),

    #[error("Unsupported chart type '{0}': expected one of line, bar, pie, scatter, area")]
    UnsupportedChartType(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
