//! Load/save pair for workbooks.

mod json;

pub use json::JsonStore;

use std::path::Path;

use crate::error::Result;
use crate::workbook::Workbook;

/// Somewhere workbooks can be read from and written back to.
pub trait WorkbookStore {
    fn load(&self, path: &Path) -> Result<Workbook>;
    fn save(&self, path: &Path, workbook: &Workbook) -> Result<()>;
}
