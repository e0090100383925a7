//! Spreadsheet addressing and cell records.
//!
//! - [`CellRef`] - A1 notation <-> one-based row/column
//! - [`CellRange`] - rectangular ranges, shifting and intersection
//! - [`Cell`], [`CellType`] - sparse cell contents
//! - [`Style`] and friends - per-cell style records
//! - [`validate_formula`] - formula syntax checks

mod cell;
mod cell_ref;
mod formula;
mod range;
mod style;

pub use cell::{Cell, CellType, format_number};
pub use cell_ref::{CellRef, MAX_COL, MAX_ROW};
pub use formula::{FormulaCheck, validate_formula};
pub use range::CellRange;
pub use style::{
    Alignment, BorderEdge, BorderStyle, Borders, Color, Font, HorizontalAlignment, Protection,
    Style, VerticalAlignment,
};
