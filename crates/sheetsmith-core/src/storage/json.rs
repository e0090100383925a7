//! JSON workbook files.
//!
//! Cells are written row-major as `{"cell": "A1", "value": ..., "style": ...}`
//! records; merge groups as range strings. The merge index is rebuilt (and so
//! re-checked for overlaps) on load.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use sheetsmith_engine::chart::ChartDescriptor;
use sheetsmith_engine::engine::{Cell, CellRange, CellRef, CellType, Style};

use super::WorkbookStore;
use crate::error::{Result, SheetError};
use crate::sheet::{ConditionalFormat, Worksheet};
use crate::workbook::Workbook;

const FORMAT_TAG: &str = "sheetsmith";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct WorkbookFile {
    format: String,
    version: u32,
    sheets: Vec<SheetRecord>,
}

#[derive(Serialize, Deserialize)]
struct SheetRecord {
    name: String,
    #[serde(default)]
    cells: Vec<CellRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    merges: Vec<CellRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    charts: Vec<ChartDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditional_formats: Vec<ConditionalFormat>,
}

#[derive(Serialize, Deserialize)]
struct CellRecord {
    cell: CellRef,
    #[serde(default)]
    value: CellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<Style>,
}

fn invalid_data(path: &Path, message: &str) -> SheetError {
    SheetError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("{}: {}", path.display(), message),
    ))
}

impl SheetRecord {
    fn from_sheet(sheet: &Worksheet) -> Self {
        SheetRecord {
            name: sheet.name.clone(),
            cells: sheet
                .grid
                .iter()
                .map(|(at, cell)| CellRecord {
                    cell: at,
                    value: cell.contents.clone(),
                    style: cell.style.clone(),
                })
                .collect(),
            merges: sheet.merges.ranges(),
            charts: sheet.charts.clone(),
            conditional_formats: sheet.conditional_formats.clone(),
        }
    }

    fn into_sheet(self) -> Result<Worksheet> {
        let mut sheet = Worksheet::new(&self.name);
        for record in self.cells {
            sheet.grid.put(
                record.cell,
                Cell {
                    contents: record.value,
                    style: record.style,
                },
            );
        }
        for range in self.merges {
            sheet.merges.insert(range)?;
        }
        sheet.charts = self.charts;
        sheet.conditional_formats = self.conditional_formats;
        Ok(sheet)
    }
}

/// Stores workbooks as pretty-printed JSON files.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonStore;

impl JsonStore {
    pub fn new() -> Self {
        JsonStore
    }

    /// Serialize a workbook to the on-disk JSON text.
    /// Non-finite numbers have no JSON form, so a sheet holding one is
    /// refused rather than written as `null`.
    pub fn to_json(workbook: &Workbook) -> Result<String> {
        for sheet in workbook.sheets() {
            let bad = sheet.grid.iter().find(|(_, cell)| {
                matches!(cell.contents, CellType::Number(n) if !n.is_finite())
            });
            if let Some((at, _)) = bad {
                return Err(SheetError::Json(serde::ser::Error::custom(format!(
                    "cell {at} on sheet '{}' holds a non-finite number",
                    sheet.name
                ))));
            }
        }
        let file = WorkbookFile {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            sheets: workbook.sheets().iter().map(SheetRecord::from_sheet).collect(),
        };
        let mut text = serde_json::to_string_pretty(&file)?;
        text.push('\n');
        Ok(text)
    }

    /// Parse on-disk JSON text. `path` is only used in error messages.
    pub fn from_json(path: &Path, text: &str) -> Result<Workbook> {
        let file: WorkbookFile = serde_json::from_str(text)?;
        if file.format != FORMAT_TAG {
            return Err(invalid_data(path, "not a sheetsmith workbook"));
        }
        if file.version > FORMAT_VERSION {
            return Err(invalid_data(
                path,
                &format!("unsupported workbook version {}", file.version),
            ));
        }
        if file.sheets.is_empty() {
            return Err(invalid_data(path, "workbook has no sheets"));
        }
        let sheets = file
            .sheets
            .into_iter()
            .map(SheetRecord::into_sheet)
            .collect::<Result<Vec<_>>>()?;
        Workbook::from_sheets(sheets)
    }
}

impl WorkbookStore for JsonStore {
    fn load(&self, path: &Path) -> Result<Workbook> {
        if !path.is_file() {
            return Err(SheetError::NotFound(format!(
                "Workbook '{}'",
                path.display()
            )));
        }
        let text = fs::read_to_string(path)?;
        let workbook = Self::from_json(path, &text)?;
        log::info!(
            "loaded {} ({} sheets)",
            path.display(),
            workbook.sheets().len()
        );
        Ok(workbook)
    }

    fn save(&self, path: &Path, workbook: &Workbook) -> Result<()> {
        let text = Self::to_json(workbook)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        log::info!("saved {}", path.display());
        Ok(())
    }
}
