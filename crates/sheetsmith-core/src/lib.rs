//! sheetsmith-core - workbook model, structural edits, pivots and storage.

pub mod chart;
pub mod config;
pub mod error;
pub mod pivot;
pub mod session;
pub mod sheet;
pub mod storage;
pub mod workbook;

pub use chart::ChartLabels;
pub use config::Config;
pub use error::{ErrorKind, ErrorReport, Result, SheetError};
pub use pivot::{AggFunc, PivotRequest, PivotSummary};
pub use session::{PivotOptions, RangeReport, Session, SheetMetadata, WorkbookMetadata};
pub use sheet::{FormatOptions, ShiftDirection, Worksheet};
pub use storage::{JsonStore, WorkbookStore};
pub use workbook::Workbook;

pub use sheetsmith_engine::engine::{CellRange, CellRef};
