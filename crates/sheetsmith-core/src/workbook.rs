//! Workbook: an ordered set of uniquely named worksheets.

use sheetsmith_engine::engine::{CellRange, CellRef};

use crate::error::{Result, SheetError};
use crate::sheet::Worksheet;

const MAX_SHEET_NAME_LEN: usize = 31;
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Check a sheet name against the xlsx naming rules.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| SheetError::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if name.contains(FORBIDDEN_SHEET_CHARS) {
        return Err(invalid("name contains one of [ ] : * ? / \\"));
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    /// A workbook with a single empty sheet.
    pub fn new(default_sheet: &str) -> Result<Self> {
        validate_sheet_name(default_sheet)?;
        Ok(Workbook {
            sheets: vec![Worksheet::new(default_sheet)],
        })
    }

    /// Assemble a workbook from already-built sheets (used by storage).
    pub fn from_sheets(sheets: Vec<Worksheet>) -> Result<Self> {
        let mut workbook = Workbook::default();
        for sheet in sheets {
            validate_sheet_name(&sheet.name)?;
            if workbook.contains(&sheet.name) {
                return Err(SheetError::SheetExists(sheet.name));
            }
            workbook.sheets.push(sheet);
        }
        Ok(workbook)
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SheetError::NotFound(format!("Sheet '{name}'")))
    }

    pub fn sheet(&self, name: &str) -> Result<&Worksheet> {
        let idx = self.position(name)?;
        Ok(&self.sheets[idx])
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Worksheet> {
        let idx = self.position(name)?;
        Ok(&mut self.sheets[idx])
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        validate_sheet_name(name)?;
        if self.contains(name) {
            return Err(SheetError::SheetExists(name.to_string()));
        }
        Ok(())
    }

    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        self.ensure_free(name)?;
        self.sheets.push(Worksheet::new(name));
        let last = self.sheets.len() - 1;
        Ok(&mut self.sheets[last])
    }

    /// Rename a sheet and re-point charts that read from it by name.
    pub fn rename_sheet(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let idx = self.position(old_name)?;
        if old_name == new_name {
            return Ok(());
        }
        self.ensure_free(new_name)?;
        self.sheets[idx].name = new_name.to_string();
        for sheet in &mut self.sheets {
            for chart in &mut sheet.charts {
                if chart.data_sheet.as_deref() == Some(old_name) {
                    chart.data_sheet = Some(new_name.to_string());
                }
            }
        }
        Ok(())
    }

    /// Deep-copy a sheet under a new name, placed after the last sheet.
    pub fn copy_sheet(&mut self, source: &str, target: &str) -> Result<()> {
        let idx = self.position(source)?;
        self.ensure_free(target)?;
        let mut copy = self.sheets[idx].clone();
        copy.name = target.to_string();
        self.sheets.push(copy);
        Ok(())
    }

    pub fn delete_sheet(&mut self, name: &str) -> Result<()> {
        let idx = self.position(name)?;
        if self.sheets.len() == 1 {
            return Err(SheetError::LastSheet(name.to_string()));
        }
        self.sheets.remove(idx);
        Ok(())
    }

    /// Copy `range` of `source_sheet` so its top-left lands on `target_start`
    /// in `target_sheet` (defaults to the source sheet). Returns the number of
    /// cells written.
    pub fn copy_range(
        &mut self,
        source_sheet: &str,
        range: CellRange,
        target_start: CellRef,
        target_sheet: Option<&str>,
    ) -> Result<usize> {
        let snapshot = self.sheet(source_sheet)?.snapshot(range);
        let target = self.sheet_mut(target_sheet.unwrap_or(source_sheet))?;
        target.paste(&snapshot, target_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsmith_engine::chart::{ChartDescriptor, ChartKind};
    use sheetsmith_engine::engine::CellType;

    #[test]
    fn test_new_has_one_sheet() {
        let wb = Workbook::new("Sheet1").unwrap();
        assert_eq!(wb.sheet_names(), vec!["Sheet1"]);
    }

    #[test]
    fn test_sheet_names_are_unique_and_case_sensitive() {
        let mut wb = Workbook::new("Sheet1").unwrap();
        assert!(matches!(
            wb.add_sheet("Sheet1"),
            Err(SheetError::SheetExists(_))
        ));
        wb.add_sheet("sheet1").unwrap();
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "sheet1"]);
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut wb = Workbook::new("Sheet1").unwrap();
        for bad in ["", "   ", "a/b", "x[1]", &"n".repeat(32)] {
            assert!(
                matches!(wb.add_sheet(bad), Err(SheetError::InvalidSheetName { .. })),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_rename_collision_fails() {
        let mut wb = Workbook::new("Sheet1").unwrap();
        wb.add_sheet("Data").unwrap();
        assert!(matches!(
            wb.rename_sheet("Sheet1", "Data"),
            Err(SheetError::SheetExists(_))
        ));
        assert!(matches!(
            wb.rename_sheet("Missing", "Other"),
            Err(SheetError::NotFound(_))
        ));
        wb.rename_sheet("Sheet1", "Summary").unwrap();
        assert_eq!(wb.sheet_names(), vec!["Summary", "Data"]);
    }

    #[test]
    fn test_rename_repoints_charts() {
        let mut wb = Workbook::new("Report").unwrap();
        wb.add_sheet("Data").unwrap();
        wb.sheet_mut("Report").unwrap().charts.push(ChartDescriptor {
            id: 1,
            kind: ChartKind::Bar,
            data_sheet: Some("Data".to_string()),
            data_range: CellRange::parse("A1:B4").unwrap(),
            anchor: CellRef::new(1, 1),
            title: None,
            x_axis: None,
            y_axis: None,
        });
        wb.rename_sheet("Data", "Raw").unwrap();
        let chart = &wb.sheet("Report").unwrap().charts[0];
        assert_eq!(chart.data_sheet.as_deref(), Some("Raw"));
    }

    #[test]
    fn test_copy_sheet_is_independent() {
        let mut wb = Workbook::new("Sheet1").unwrap();
        wb.sheet_mut("Sheet1")
            .unwrap()
            .grid
            .set(CellRef::new(1, 1), CellType::Number(1.0), None);
        wb.copy_sheet("Sheet1", "Copy").unwrap();
        wb.sheet_mut("Copy")
            .unwrap()
            .grid
            .set(CellRef::new(1, 1), CellType::Number(2.0), None);
        let original = wb.sheet("Sheet1").unwrap().grid.get(CellRef::new(1, 1));
        assert_eq!(original.unwrap().contents, CellType::Number(1.0));
    }

    #[test]
    fn test_cannot_delete_last_sheet() {
        let mut wb = Workbook::new("Sheet1").unwrap();
        assert!(matches!(
            wb.delete_sheet("Sheet1"),
            Err(SheetError::LastSheet(_))
        ));
        wb.add_sheet("Other").unwrap();
        wb.delete_sheet("Sheet1").unwrap();
        assert_eq!(wb.sheet_names(), vec!["Other"]);
    }

    #[test]
    fn test_copy_range_across_sheets() {
        let mut wb = Workbook::new("Src").unwrap();
        wb.add_sheet("Dst").unwrap();
        wb.sheet_mut("Src")
            .unwrap()
            .grid
            .set(CellRef::new(1, 1), CellType::Text("x".to_string()), None);
        let written = wb
            .copy_range(
                "Src",
                CellRange::parse("A1:B2").unwrap(),
                CellRef::new(3, 3),
                Some("Dst"),
            )
            .unwrap();
        assert_eq!(written, 1);
        let copied = wb.sheet("Dst").unwrap().grid.get(CellRef::new(3, 3));
        assert_eq!(copied.unwrap().contents, CellType::Text("x".to_string()));
        assert!(matches!(
            wb.copy_range("Src", CellRange::parse("A1").unwrap(), CellRef::new(1, 1), Some("Nope")),
            Err(SheetError::NotFound(_))
        ));
    }
}
