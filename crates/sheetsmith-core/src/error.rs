//! Error types for Sheetsmith core.

use serde::Serialize;
use thiserror::Error;

use sheetsmith_engine::EngineError;

/// Errors that can occur while manipulating a workbook.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Range {range} overlaps merged range {existing}")]
    OverlappingMerge { range: String, existing: String },

    #[error("No merged range exactly matches {0}")]
    MergeNotFound(String),

    #[error("Cannot shift: merged range {0} would be split")]
    MergeSplit(String),

    #[error("Cell {0} is inside a merged range and cannot hold a value")]
    MergedCell(String),

    #[error("Invalid formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("Invalid shift direction '{0}': expected 'up' or 'left'")]
    InvalidShiftDirection(String),

    #[error("Cannot aggregate non-numeric value '{value}' in field '{field}' at {cell}")]
    NonNumericAggregation {
        field: String,
        value: String,
        cell: String,
    },

    #[error("Unsupported aggregation '{0}': expected sum, count, average, max or min")]
    UnsupportedAggregation(String),

    #[error("Invalid pivot table: {0}")]
    InvalidPivot(String),

    #[error("Sheet '{0}' already exists")]
    SheetExists(String),

    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },

    #[error("Cannot delete '{0}': a workbook must keep at least one sheet")]
    LastSheet(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("No data provided to write")]
    EmptyData,

    #[error("Invalid path '{0}': relative paths need a configured files directory")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stable error names reported to callers alongside the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidReferenceError,
    InvalidRangeError,
    OutOfBoundsError,
    InvalidColorError,
    InvalidAlignmentError,
    InvalidBorderStyleError,
    OverlappingMergeError,
    MergeNotFoundError,
    MergeSplitError,
    MergedCellError,
    InvalidFormulaError,
    InvalidShiftDirectionError,
    NonNumericAggregationError,
    UnsupportedAggregationError,
    InvalidPivotError,
    UnsupportedChartTypeError,
    SheetExistsError,
    InvalidSheetNameError,
    LastSheetError,
    NotFoundError,
    EmptyDataError,
    InvalidPathError,
    IoError,
    SerializationError,
}

impl SheetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetError::Engine(err) => match err {
                EngineError::InvalidReference(_) => ErrorKind::InvalidReferenceError,
                EngineError::InvalidRange { .. } => ErrorKind::InvalidRangeError,
                EngineError::OutOfBounds { .. } => ErrorKind::OutOfBoundsError,
                EngineError::InvalidColor(_) => ErrorKind::InvalidColorError,
                EngineError::InvalidAlignment(_) => ErrorKind::InvalidAlignmentError,
                EngineError::InvalidBorderStyle(_) => ErrorKind::InvalidBorderStyleError,
                EngineError::UnsupportedChartType(_) => ErrorKind::UnsupportedChartTypeError,
            },
            SheetError::OverlappingMerge { .. } => ErrorKind::OverlappingMergeError,
            SheetError::MergeNotFound(_) => ErrorKind::MergeNotFoundError,
            SheetError::MergeSplit(_) => ErrorKind::MergeSplitError,
            SheetError::MergedCell(_) => ErrorKind::MergedCellError,
            SheetError::InvalidFormula { .. } => ErrorKind::InvalidFormulaError,
            SheetError::InvalidShiftDirection(_) => ErrorKind::InvalidShiftDirectionError,
            SheetError::NonNumericAggregation { .. } => ErrorKind::NonNumericAggregationError,
            SheetError::UnsupportedAggregation(_) => ErrorKind::UnsupportedAggregationError,
            SheetError::InvalidPivot(_) => ErrorKind::InvalidPivotError,
            SheetError::SheetExists(_) => ErrorKind::SheetExistsError,
            SheetError::InvalidSheetName { .. } => ErrorKind::InvalidSheetNameError,
            SheetError::LastSheet(_) => ErrorKind::LastSheetError,
            SheetError::NotFound(_) => ErrorKind::NotFoundError,
            SheetError::EmptyData => ErrorKind::EmptyDataError,
            SheetError::InvalidPath(_) => ErrorKind::InvalidPathError,
            SheetError::Io(_) => ErrorKind::IoError,
            SheetError::Json(_) => ErrorKind::SerializationError,
        }
    }
}

/// The structured error shape handed back to callers.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&SheetError> for ErrorReport {
    fn from(err: &SheetError) -> Self {
        ErrorReport {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
