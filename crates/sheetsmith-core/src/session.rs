//! The operation surface.
//!
//! A [`Session`] owns its configuration and store. Each call loads the
//! workbook, validates its arguments, mutates, saves (for mutating calls) and
//! returns. Nothing is kept between calls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use sheetsmith_engine::EngineError;
use sheetsmith_engine::chart::{ChartDescriptor, ChartKind};
use sheetsmith_engine::engine::{
    CellRange, CellRef, CellType, FormulaCheck, format_number, validate_formula,
};

use crate::chart::ChartLabels;
use crate::config::Config;
use crate::error::{Result, SheetError};
use crate::pivot::{AggFunc, PivotRequest, PivotSummary};
use crate::sheet::{FormatOptions, ShiftDirection, Worksheet};
use crate::storage::{JsonStore, WorkbookStore};
use crate::workbook::Workbook;

/// File-level facts about a workbook.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkbookMetadata {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Last modification time, RFC 3339.
    pub modified: Option<String>,
    pub sheets: Vec<SheetMetadata>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SheetMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_range: Option<CellRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_ranges: Option<Vec<CellRange>>,
    pub charts: Vec<ChartDescriptor>,
}

/// Shape of a range and where it sits relative to the data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RangeReport {
    pub range: CellRange,
    pub rows: u32,
    pub columns: u32,
    pub cells: u64,
    pub used_range: Option<CellRange>,
    pub within_used_range: bool,
}

/// Field lists and aggregation for a pivot table.
#[derive(Clone, Debug, Default)]
pub struct PivotOptions {
    pub rows: Vec<String>,
    pub values: Vec<String>,
    pub columns: Vec<String>,
    /// Defaults to average.
    pub agg_func: Option<String>,
}

fn parse_range(start: &str, end: Option<&str>) -> Result<CellRange> {
    Ok(CellRange::from_corners(start, end)?)
}

fn json_to_contents(value: &Value) -> CellType {
    match value {
        Value::Null => CellType::Empty,
        Value::Bool(b) => CellType::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => CellType::Number(f),
            None => CellType::Text(n.to_string()),
        },
        Value::String(s) if s.starts_with('=') => CellType::Formula(s.clone()),
        Value::String(s) => CellType::Text(s.clone()),
        other => CellType::Text(other.to_string()),
    }
}

fn contents_to_json(contents: &CellType) -> Value {
    match contents {
        CellType::Empty => Value::Null,
        CellType::Text(s) | CellType::Formula(s) => Value::String(s.clone()),
        CellType::Bool(b) => Value::Bool(*b),
        CellType::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(format_number(*n))),
    }
}

pub struct Session<S: WorkbookStore = JsonStore> {
    config: Config,
    store: S,
}

impl Session<JsonStore> {
    /// A session backed by JSON workbook files.
    pub fn with_json_store(config: Config) -> Self {
        Session::new(config, JsonStore::new())
    }
}

impl<S: WorkbookStore> Session<S> {
    pub fn new(config: Config, store: S) -> Self {
        Session { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn open(&self, path: &str) -> Result<(PathBuf, Workbook)> {
        let path = self.config.resolve_path(path)?;
        let workbook = self.store.load(&path)?;
        Ok((path, workbook))
    }

    /// Load, run `edit`, and save only if it succeeded.
    fn edit<T>(&self, path: &str, edit: impl FnOnce(&mut Workbook) -> Result<T>) -> Result<T> {
        let (path, mut workbook) = self.open(path)?;
        let out = edit(&mut workbook)?;
        self.store.save(&path, &workbook)?;
        Ok(out)
    }

    fn edit_sheet<T>(
        &self,
        path: &str,
        sheet: &str,
        edit: impl FnOnce(&mut Worksheet) -> Result<T>,
    ) -> Result<T> {
        self.edit(path, |workbook| edit(workbook.sheet_mut(sheet)?))
    }

    pub fn create_workbook(&self, path: &str) -> Result<String> {
        let resolved = self.config.resolve_path(path)?;
        if resolved.exists() {
            log::warn!("overwriting existing workbook {}", resolved.display());
        }
        let workbook = Workbook::new(&self.config.default_sheet_name)?;
        self.store.save(&resolved, &workbook)?;
        Ok(format!("Created workbook at {}", resolved.display()))
    }

    pub fn create_worksheet(&self, path: &str, sheet_name: &str) -> Result<String> {
        self.edit(path, |workbook| workbook.add_sheet(sheet_name).map(|_| ()))?;
        Ok(format!("Sheet '{sheet_name}' created"))
    }

    pub fn get_workbook_metadata(
        &self,
        path: &str,
        include_ranges: bool,
    ) -> Result<WorkbookMetadata> {
        let (path, workbook) = self.open(path)?;
        let file = fs::metadata(&path)?;
        let modified = file
            .modified()
            .ok()
            .map(|time| DateTime::<Utc>::from(time).to_rfc3339());
        let sheets = workbook
            .sheets()
            .iter()
            .map(|sheet| SheetMetadata {
                name: sheet.name.clone(),
                used_range: include_ranges.then(|| sheet.grid.used_range()).flatten(),
                merged_ranges: include_ranges.then(|| sheet.merges.ranges()),
                charts: sheet.charts.clone(),
            })
            .collect();
        Ok(WorkbookMetadata {
            path,
            size_bytes: file.len(),
            modified,
            sheets,
        })
    }

    /// Write rows of JSON scalars starting at `start_cell` (default `A1`).
    /// `null` leaves a cell alone; strings starting with `=` are stored as
    /// formula text without validation.
    pub fn write_data_to_excel(
        &self,
        path: &str,
        sheet_name: &str,
        data: &[Vec<Value>],
        start_cell: Option<&str>,
    ) -> Result<String> {
        let width = data.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return Err(SheetError::EmptyData);
        }
        let start = CellRef::parse(start_cell.unwrap_or("A1"))?;
        let footprint = CellRange::new(
            CellRef::new(1, 1),
            CellRef::new(data.len() as u32, width as u32),
        )?
        .move_to(start)?;

        let writes: Vec<(CellRef, CellType)> = data
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter().enumerate().filter_map(move |(c, value)| {
                    let contents = json_to_contents(value);
                    if contents.is_empty() {
                        return None;
                    }
                    let at = CellRef::new(start.row + r as u32, start.col + c as u32);
                    Some((at, contents))
                })
            })
            .collect();

        let written = writes.len();
        self.edit_sheet(path, sheet_name, |sheet| {
            for (at, _) in &writes {
                sheet.ensure_writable(*at)?;
            }
            for (at, contents) in writes {
                sheet.grid.set(at, contents, None);
            }
            log::debug!("wrote {} cells to {} on '{}'", written, footprint, sheet.name);
            Ok(())
        })?;
        Ok(format!(
            "Wrote {written} cells to '{sheet_name}' starting at {start}"
        ))
    }

    /// Read a dense block of values. Without `end_cell` the block runs to the
    /// bottom-right of the used range. Cells hidden by a merge read as `null`.
    pub fn read_data_from_excel(
        &self,
        path: &str,
        sheet_name: &str,
        start_cell: Option<&str>,
        end_cell: Option<&str>,
        preview_only: bool,
    ) -> Result<Vec<Vec<Value>>> {
        let start = CellRef::parse(start_cell.unwrap_or("A1"))?;
        let end = end_cell.map(CellRef::parse).transpose()?;
        let (_, workbook) = self.open(path)?;
        let sheet = workbook.sheet(sheet_name)?;

        let end = match end {
            Some(end) => end,
            None => match sheet.grid.used_range() {
                Some(used) if used.end.row >= start.row && used.end.col >= start.col => used.end,
                _ => return Ok(Vec::new()),
            },
        };
        let range = CellRange::new(start, end)?;
        let mut rows = range.height() as usize;
        if preview_only {
            rows = rows.min(self.config.preview_rows);
        }
        let cells = rows as u64 * range.width() as u64;
        if cells > self.config.max_read_cells {
            return Err(EngineError::InvalidRange {
                range: range.to_string(),
                reason: format!(
                    "reading {cells} cells exceeds the limit of {}",
                    self.config.max_read_cells
                ),
            }
            .into());
        }

        let out = (range.start.row..)
            .take(rows)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| {
                        let at = CellRef::new(row, col);
                        match sheet.merges.group_of(at) {
                            Some(group) if group.start != at => Value::Null,
                            _ => sheet
                                .grid
                                .get(at)
                                .map(|cell| contents_to_json(&cell.contents))
                                .unwrap_or(Value::Null),
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(out)
    }

    pub fn format_range(
        &self,
        path: &str,
        sheet_name: &str,
        start_cell: &str,
        end_cell: Option<&str>,
        options: &FormatOptions,
    ) -> Result<String> {
        let range = parse_range(start_cell, end_cell)?;
        options.resolve()?;
        self.edit_sheet(path, sheet_name, |sheet| sheet.apply_format(range, options))?;
        Ok(format!("Range {range} formatted"))
    }

    pub fn merge_cells(
        &self,
        path: &str,
        sheet_name: &str,
        start_cell: &str,
        end_cell: &str,
    ) -> Result<String> {
        let range = parse_range(start_cell, Some(end_cell))?;
        self.edit_sheet(path, sheet_name, |sheet| sheet.merge(range))?;
        Ok(format!("Range {range} merged"))
    }

    pub fn unmerge_cells(
        &self,
        path: &str,
        sheet_name: &str,
        start_cell: &str,
        end_cell: &str,
    ) -> Result<String> {
        let range = parse_range(start_cell, Some(end_cell))?;
        self.edit_sheet(path, sheet_name, |sheet| sheet.unmerge(range))?;
        Ok(format!("Range {range} unmerged"))
    }

    pub fn apply_formula(
        &self,
        path: &str,
        sheet_name: &str,
        cell: &str,
        formula: &str,
    ) -> Result<String> {
        let at = CellRef::parse(cell)?;
        let check = self.edit_sheet(path, sheet_name, |sheet| sheet.apply_formula(at, formula))?;
        let mut message = format!("Applied formula '{}' to {at}", formula.trim());
        if !check.warnings.is_empty() {
            message.push_str(&format!(" ({})", check.warnings.join("; ")));
        }
        Ok(message)
    }

    /// Check formula text for `cell` without touching the workbook.
    pub fn validate_formula_syntax(
        &self,
        path: &str,
        sheet_name: &str,
        cell: &str,
        formula: &str,
    ) -> Result<FormulaCheck> {
        CellRef::parse(cell)?;
        let (_, workbook) = self.open(path)?;
        workbook.sheet(sheet_name)?;
        Ok(validate_formula(formula))
    }

    pub fn create_chart(
        &self,
        path: &str,
        sheet_name: &str,
        data_range: &str,
        chart_type: &str,
        target_cell: &str,
        labels: ChartLabels,
    ) -> Result<ChartDescriptor> {
        let kind: ChartKind = chart_type.parse()?;
        let anchor = CellRef::parse(target_cell)?;
        CellRange::parse_qualified(data_range)?;
        self.edit(path, |workbook| {
            workbook.create_chart(sheet_name, data_range, kind, anchor, labels)
        })
    }

    /// Build a pivot table from `data_range`. Without `target_cell` the
    /// output starts two columns right of the source, on its header row.
    pub fn create_pivot_table(
        &self,
        path: &str,
        sheet_name: &str,
        data_range: &str,
        target_cell: Option<&str>,
        options: &PivotOptions,
    ) -> Result<PivotSummary> {
        let source = CellRange::parse(data_range)?;
        let agg = match &options.agg_func {
            Some(name) => name.parse::<AggFunc>()?,
            None => AggFunc::default(),
        };
        let target = match target_cell {
            Some(cell) => CellRef::parse(cell)?,
            None => CellRef::new(source.start.row, source.end.col)
                .offset(0, 2)
                .ok_or_else(|| sheetsmith_engine::EngineError::OutOfBounds {
                    range: source.to_string(),
                    row_offset: 0,
                    col_offset: 2,
                })?,
        };
        let request = PivotRequest {
            source,
            rows: options.rows.clone(),
            values: options.values.clone(),
            columns: options.columns.clone(),
            agg,
            target,
        };
        self.edit_sheet(path, sheet_name, |sheet| sheet.build_pivot(&request))
    }

    pub fn copy_worksheet(&self, path: &str, source: &str, target: &str) -> Result<String> {
        self.edit(path, |workbook| workbook.copy_sheet(source, target))?;
        Ok(format!("Sheet '{source}' copied to '{target}'"))
    }

    pub fn delete_worksheet(&self, path: &str, sheet_name: &str) -> Result<String> {
        self.edit(path, |workbook| workbook.delete_sheet(sheet_name))?;
        Ok(format!("Sheet '{sheet_name}' deleted"))
    }

    pub fn rename_worksheet(&self, path: &str, old_name: &str, new_name: &str) -> Result<String> {
        self.edit(path, |workbook| workbook.rename_sheet(old_name, new_name))?;
        Ok(format!("Sheet '{old_name}' renamed to '{new_name}'"))
    }

    /// Copy a block of cells. Formula text is copied verbatim; references
    /// inside it are not adjusted. Returns the number of cells written.
    pub fn copy_range(
        &self,
        path: &str,
        sheet_name: &str,
        source_start: &str,
        source_end: Option<&str>,
        target_start: &str,
        target_sheet: Option<&str>,
    ) -> Result<usize> {
        let range = parse_range(source_start, source_end)?;
        let target = CellRef::parse(target_start)?;
        self.edit(path, |workbook| {
            workbook.copy_range(sheet_name, range, target, target_sheet)
        })
    }

    /// Delete a range and shift neighbouring cells into it (default `up`).
    pub fn delete_range(
        &self,
        path: &str,
        sheet_name: &str,
        start_cell: &str,
        end_cell: Option<&str>,
        shift_direction: Option<&str>,
    ) -> Result<String> {
        let direction: ShiftDirection = shift_direction.unwrap_or("up").parse()?;
        let range = parse_range(start_cell, end_cell)?;
        self.edit_sheet(path, sheet_name, |sheet| sheet.delete_range(range, direction))?;
        Ok(format!("Range {range} deleted"))
    }

    pub fn validate_excel_range(
        &self,
        path: &str,
        sheet_name: &str,
        start_cell: &str,
        end_cell: Option<&str>,
    ) -> Result<RangeReport> {
        let range = parse_range(start_cell, end_cell)?;
        let (_, workbook) = self.open(path)?;
        let used_range = workbook.sheet(sheet_name)?.grid.used_range();
        Ok(RangeReport {
            range,
            rows: range.height(),
            columns: range.width(),
            cells: range.cell_count(),
            used_range,
            within_used_range: used_range.is_some_and(|used| used.contains_range(&range)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};

    fn session() -> (TempDir, Session) {
        let dir = tempdir().unwrap();
        let config = Config {
            files_dir: Some(dir.path().to_path_buf()),
            preview_rows: 2,
            ..Config::default()
        };
        let session = Session::with_json_store(config);
        session.create_workbook("book.json").unwrap();
        (dir, session)
    }

    fn rows(values: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(values).unwrap()
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, s) = session();
        s.write_data_to_excel(
            "book.json",
            "Sheet1",
            &rows(json!([["name", "qty"], ["apple", 3], ["pear", null]])),
            Some("B2"),
        )
        .unwrap();
        let data = s
            .read_data_from_excel("book.json", "Sheet1", Some("B2"), None, false)
            .unwrap();
        assert_eq!(
            data,
            rows(json!([["name", "qty"], ["apple", 3.0], ["pear", null]]))
        );
        let preview = s
            .read_data_from_excel("book.json", "Sheet1", Some("B2"), None, true)
            .unwrap();
        assert_eq!(preview.len(), 2);
    }

    #[test]
    fn test_oversized_read_is_rejected() {
        let (_dir, s) = session();
        s.write_data_to_excel("book.json", "Sheet1", &rows(json!([[1]])), None)
            .unwrap();
        let err = s
            .read_data_from_excel("book.json", "Sheet1", Some("A1"), Some("XFD1048576"), false)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidRangeError);
        // preview caps rows before the limit applies
        let preview = s
            .read_data_from_excel("book.json", "Sheet1", Some("A1"), Some("BA1048576"), true)
            .unwrap();
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0].len(), 53);
    }

    #[test]
    fn test_write_nothing_fails() {
        let (_dir, s) = session();
        let err = s
            .write_data_to_excel("book.json", "Sheet1", &[], None)
            .unwrap_err();
        assert!(matches!(err, SheetError::EmptyData));
    }

    #[test]
    fn test_merged_cells_read_as_null() {
        let (_dir, s) = session();
        s.write_data_to_excel("book.json", "Sheet1", &rows(json!([["a", "b"]])), None)
            .unwrap();
        s.merge_cells("book.json", "Sheet1", "A1", "B1").unwrap();
        let data = s
            .read_data_from_excel("book.json", "Sheet1", None, Some("B1"), false)
            .unwrap();
        assert_eq!(data, rows(json!([["a", null]])));
        let err = s
            .write_data_to_excel("book.json", "Sheet1", &rows(json!([["x"]])), Some("B1"))
            .unwrap_err();
        assert!(matches!(err, SheetError::MergedCell(_)));
    }

    #[test]
    fn test_failed_edit_is_not_saved() {
        let (_dir, s) = session();
        s.merge_cells("book.json", "Sheet1", "A1", "B2").unwrap();
        assert!(matches!(
            s.merge_cells("book.json", "Sheet1", "B2", "C3"),
            Err(SheetError::OverlappingMerge { .. })
        ));
        s.unmerge_cells("book.json", "Sheet1", "A1", "B2").unwrap();
        s.merge_cells("book.json", "Sheet1", "B2", "C3").unwrap();
    }

    #[test]
    fn test_bad_direction_fails_before_loading() {
        let (_dir, s) = session();
        let err = s
            .delete_range("missing.json", "Sheet1", "A1", None, Some("down"))
            .unwrap_err();
        assert!(matches!(err, SheetError::InvalidShiftDirection(_)));
    }

    #[test]
    fn test_pivot_defaults_target_beside_source() {
        let (_dir, s) = session();
        s.write_data_to_excel(
            "book.json",
            "Sheet1",
            &rows(json!([["region", "amount"], ["east", 10], ["west", 20], ["east", 5]])),
            None,
        )
        .unwrap();
        let summary = s
            .create_pivot_table(
                "book.json",
                "Sheet1",
                "A1:B4",
                None,
                &PivotOptions {
                    rows: vec!["region".to_string()],
                    values: vec!["amount".to_string()],
                    agg_func: Some("sum".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(summary.output_range, CellRange::parse("D1:E3").unwrap());
        let data = s
            .read_data_from_excel("book.json", "Sheet1", Some("D1"), Some("E3"), false)
            .unwrap();
        assert_eq!(
            data,
            rows(json!([["region", "amount (sum)"], ["east", 15.0], ["west", 20.0]]))
        );
    }

    #[test]
    fn test_overflowing_pivot_leaves_the_file_readable() {
        let (_dir, s) = session();
        s.write_data_to_excel(
            "book.json",
            "Sheet1",
            &rows(json!([["k", "v"], ["a", 1e308], ["a", 1e308]])),
            None,
        )
        .unwrap();
        let options = PivotOptions {
            rows: vec!["k".to_string()],
            values: vec!["v".to_string()],
            agg_func: Some("sum".to_string()),
            ..Default::default()
        };
        let err = s
            .create_pivot_table("book.json", "Sheet1", "A1:B3", None, &options)
            .unwrap_err();
        assert!(matches!(err, SheetError::InvalidPivot(_)));
        let data = s
            .read_data_from_excel("book.json", "Sheet1", None, None, false)
            .unwrap();
        assert_eq!(data, rows(json!([["k", "v"], ["a", 1e308], ["a", 1e308]])));
    }

    #[test]
    fn test_metadata_and_range_report() {
        let (_dir, s) = session();
        s.create_worksheet("book.json", "Data").unwrap();
        s.write_data_to_excel("book.json", "Data", &rows(json!([[1, 2], [3, 4]])), None)
            .unwrap();
        let meta = s.get_workbook_metadata("book.json", true).unwrap();
        assert_eq!(meta.sheets.len(), 2);
        assert_eq!(meta.sheets[1].used_range, Some(CellRange::parse("A1:B2").unwrap()));
        assert!(meta.size_bytes > 0);
        assert!(meta.modified.is_some());
        let bare = s.get_workbook_metadata("book.json", false).unwrap();
        assert_eq!(bare.sheets[1].used_range, None);

        let report = s
            .validate_excel_range("book.json", "Data", "A1", Some("B2"))
            .unwrap();
        assert!(report.within_used_range);
        assert_eq!(report.cells, 4);
        let outside = s
            .validate_excel_range("book.json", "Data", "A1", Some("C9"))
            .unwrap();
        assert!(!outside.within_used_range);
    }

    #[test]
    fn test_validate_formula_does_not_mutate() {
        let (dir, s) = session();
        let before = fs::read_to_string(dir.path().join("book.json")).unwrap();
        let check = s
            .validate_formula_syntax("book.json", "Sheet1", "A1", "=SUM(A1:A2")
            .unwrap();
        assert!(!check.valid);
        let after = fs::read_to_string(dir.path().join("book.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_copy_range_reports_written_cells() {
        let (_dir, s) = session();
        s.write_data_to_excel(
            "book.json",
            "Sheet1",
            &rows(json!([[1, 2], [3, "=A1+B1"], [5, 6]])),
            None,
        )
        .unwrap();
        let written = s
            .copy_range("book.json", "Sheet1", "A1", Some("B3"), "D5", None)
            .unwrap();
        assert_eq!(written, 6);
        let data = s
            .read_data_from_excel("book.json", "Sheet1", Some("D6"), Some("E6"), false)
            .unwrap();
        assert_eq!(data, rows(json!([[3.0, "=A1+B1"]])));
    }

    #[test]
    fn test_chart_type_is_checked() {
        let (_dir, s) = session();
        let err = s
            .create_chart(
                "book.json",
                "Sheet1",
                "A1:B3",
                "donut",
                "D1",
                ChartLabels::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnsupportedChartTypeError);
    }
}
