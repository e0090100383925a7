//! Structural edits: copying a block of cells and deleting with shift.
//!
//! Formula text is moved verbatim. References inside formulas are not
//! re-targeted by either operation.

use std::str::FromStr;

use sheetsmith_engine::engine::{Cell, CellRange, CellRef, MAX_COL, MAX_ROW};

use super::Worksheet;
use crate::error::{Result, SheetError};

/// Which way cells move to fill a deleted range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Cells below the range, in the same columns, move up.
    Up,
    /// Cells right of the range, in the same rows, move left.
    Left,
}

impl FromStr for ShiftDirection {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(ShiftDirection::Up),
            "left" => Ok(ShiftDirection::Left),
            _ => Err(SheetError::InvalidShiftDirection(s.to_string())),
        }
    }
}

impl ShiftDirection {
    /// Coordinate along the shift axis.
    fn along(self, at: CellRef) -> u32 {
        match self {
            ShiftDirection::Up => at.row,
            ShiftDirection::Left => at.col,
        }
    }

    /// Coordinate across the shift axis.
    fn across(self, at: CellRef) -> u32 {
        match self {
            ShiftDirection::Up => at.col,
            ShiftDirection::Left => at.row,
        }
    }

    fn pull_back(self, at: CellRef, by: u32) -> CellRef {
        match self {
            ShiftDirection::Up => CellRef::new(at.row - by, at.col),
            ShiftDirection::Left => CellRef::new(at.row, at.col - by),
        }
    }

    /// How far cells move when `range` is deleted.
    fn extent(self, range: &CellRange) -> u32 {
        match self {
            ShiftDirection::Up => range.height(),
            ShiftDirection::Left => range.width(),
        }
    }

    /// The band of cells that slides into the deleted range, if any.
    fn trailing_band(self, range: &CellRange) -> Option<CellRange> {
        match self {
            ShiftDirection::Up if range.end.row < MAX_ROW => Some(CellRange {
                start: CellRef::new(range.end.row + 1, range.start.col),
                end: CellRef::new(MAX_ROW, range.end.col),
            }),
            ShiftDirection::Left if range.end.col < MAX_COL => Some(CellRange {
                start: CellRef::new(range.start.row, range.end.col + 1),
                end: CellRef::new(range.end.row, MAX_COL),
            }),
            _ => None,
        }
    }

    fn pull_back_range(self, range: CellRange, by: u32) -> CellRange {
        CellRange {
            start: self.pull_back(range.start, by),
            end: self.pull_back(range.end, by),
        }
    }
}

/// Cells lifted out of a range, ready to be pasted elsewhere.
#[derive(Clone, Debug)]
pub struct RangeSnapshot {
    pub range: CellRange,
    pub cells: Vec<(CellRef, Cell)>,
}

impl Worksheet {
    /// Copy the stored cells of `range` out of the sheet.
    pub fn snapshot(&self, range: CellRange) -> RangeSnapshot {
        RangeSnapshot {
            range,
            cells: self
                .grid
                .iterate(range)
                .map(|(at, cell)| (at, cell.clone()))
                .collect(),
        }
    }

    /// Write a snapshot so its top-left lands on `target_start`. The
    /// destination mirrors the source exactly: cells absent from the
    /// snapshot are cleared. Returns the number of cells written.
    pub fn paste(&mut self, snapshot: &RangeSnapshot, target_start: CellRef) -> Result<usize> {
        let target = snapshot.range.move_to(target_start)?;
        let covered = self.merges.intersecting(&target);
        if let Some(bisected) = covered.iter().find(|g| !target.contains_range(g)) {
            return Err(SheetError::OverlappingMerge {
                range: target.to_string(),
                existing: bisected.to_string(),
            });
        }

        let row_offset = i64::from(target.start.row) - i64::from(snapshot.range.start.row);
        let col_offset = i64::from(target.start.col) - i64::from(snapshot.range.start.col);

        let stale: Vec<CellRef> = self.grid.iterate(target).map(|(at, _)| at).collect();
        for at in stale {
            self.grid.remove(at);
        }

        let mut written = 0;
        for (at, cell) in &snapshot.cells {
            let Some(dest) = at.offset(row_offset, col_offset) else {
                continue;
            };
            let mut cell = cell.clone();
            let suppressed = covered
                .iter()
                .any(|group| group.contains(dest) && group.start != dest);
            if suppressed {
                cell.contents = Default::default();
            }
            self.grid.put(dest, cell);
            written += 1;
        }
        log::debug!(
            "pasted {} cells from {} to {} on '{}'",
            written,
            snapshot.range,
            target,
            self.name
        );
        Ok(written)
    }

    /// Clear `range` and slide the trailing cells of the same band into the
    /// gap. Fails without touching anything if a merge group would be split.
    pub fn delete_range(&mut self, range: CellRange, direction: ShiftDirection) -> Result<()> {
        let band = direction.trailing_band(&range);
        let by = direction.extent(&range);

        let inside = self.merges.intersecting(&range);
        if let Some(split) = inside.iter().find(|g| !range.contains_range(g)) {
            return Err(SheetError::MergeSplit(split.to_string()));
        }
        let moving = match &band {
            Some(band) => self.merges.intersecting(band),
            None => Vec::new(),
        };
        let band_across = (direction.across(range.start), direction.across(range.end));
        if let Some(split) = moving.iter().find(|g| {
            direction.across(g.start) < band_across.0 || direction.across(g.end) > band_across.1
        }) {
            return Err(SheetError::MergeSplit(split.to_string()));
        }

        for group in inside.iter().chain(moving.iter()) {
            self.merges.remove(group)?;
        }
        for group in &moving {
            self.merges.insert(direction.pull_back_range(*group, by))?;
        }

        let deleted: Vec<CellRef> = self.grid.iterate(range).map(|(at, _)| at).collect();
        for at in deleted {
            self.grid.remove(at);
        }
        let trailing = match band {
            Some(band) => self.grid.keys_where(|at| band.contains(at)),
            None => Vec::new(),
        };
        let mut lifted = Vec::with_capacity(trailing.len());
        for at in trailing {
            if let Some(cell) = self.grid.remove(at) {
                lifted.push((at, cell));
            }
        }
        for (at, cell) in lifted {
            debug_assert!(direction.along(at) > by);
            self.grid.put(direction.pull_back(at, by), cell);
        }

        log::debug!(
            "deleted {} on '{}' shifting {:?}",
            range,
            self.name,
            direction
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetsmith_engine::engine::CellType;

    fn at(text: &str) -> CellRef {
        CellRef::parse(text).unwrap()
    }

    fn r(text: &str) -> CellRange {
        CellRange::parse(text).unwrap()
    }

    fn set(sheet: &mut Worksheet, name: &str, value: f64) {
        sheet.grid.set(at(name), CellType::Number(value), None);
    }

    fn value(sheet: &Worksheet, name: &str) -> Option<CellType> {
        sheet.grid.get(at(name)).map(|c| c.contents.clone())
    }

    #[test]
    fn test_shift_direction_parsing() {
        assert_eq!("up".parse::<ShiftDirection>().unwrap(), ShiftDirection::Up);
        assert_eq!("LEFT".parse::<ShiftDirection>().unwrap(), ShiftDirection::Left);
        assert!(matches!(
            "down".parse::<ShiftDirection>(),
            Err(SheetError::InvalidShiftDirection(_))
        ));
    }

    #[test]
    fn test_copy_preserves_shape_and_formula_text() {
        let mut sheet = Worksheet::new("S");
        let mut n = 0.0;
        for row in 1..=3 {
            for col in 1..=2 {
                n += 1.0;
                sheet.grid.set(CellRef::new(row, col), CellType::Number(n), None);
            }
        }
        sheet
            .grid
            .set(at("B3"), CellType::Formula("=A1+B1".to_string()), None);

        let snapshot = sheet.snapshot(r("A1:B3"));
        let written = sheet.paste(&snapshot, at("D5")).unwrap();
        assert_eq!(written, 6);
        assert_eq!(value(&sheet, "D5"), Some(CellType::Number(1.0)));
        assert_eq!(value(&sheet, "E5"), Some(CellType::Number(2.0)));
        assert_eq!(value(&sheet, "D7"), Some(CellType::Number(5.0)));
        // Formula text is copied verbatim, not re-targeted.
        assert_eq!(value(&sheet, "E7"), Some(CellType::Formula("=A1+B1".to_string())));
        assert_eq!(sheet.grid.iterate(r("D5:E7")).count(), 6);
    }

    #[test]
    fn test_copy_clears_destination_where_source_is_empty() {
        let mut sheet = Worksheet::new("S");
        set(&mut sheet, "A1", 1.0);
        set(&mut sheet, "D2", 99.0);
        set(&mut sheet, "E2", 7.0);
        set(&mut sheet, "D3", 8.0);
        let snapshot = sheet.snapshot(r("A1:B2"));
        sheet.paste(&snapshot, at("C1")).unwrap();
        assert_eq!(value(&sheet, "C1"), Some(CellType::Number(1.0)));
        assert_eq!(value(&sheet, "D2"), None);
        assert_eq!(value(&sheet, "E2"), Some(CellType::Number(7.0)));
        assert_eq!(value(&sheet, "D3"), Some(CellType::Number(8.0)));
    }

    #[test]
    fn test_copy_onto_overlapping_self() {
        let mut sheet = Worksheet::new("S");
        set(&mut sheet, "A1", 1.0);
        set(&mut sheet, "A2", 2.0);
        set(&mut sheet, "A3", 3.0);
        let snapshot = sheet.snapshot(r("A1:A3"));
        sheet.paste(&snapshot, at("A2")).unwrap();
        assert_eq!(value(&sheet, "A1"), Some(CellType::Number(1.0)));
        assert_eq!(value(&sheet, "A2"), Some(CellType::Number(1.0)));
        assert_eq!(value(&sheet, "A3"), Some(CellType::Number(2.0)));
        assert_eq!(value(&sheet, "A4"), Some(CellType::Number(3.0)));
    }

    #[test]
    fn test_copy_that_bisects_a_merge_fails() {
        let mut sheet = Worksheet::new("S");
        set(&mut sheet, "A1", 1.0);
        sheet.merge(r("D2:E2")).unwrap();
        let snapshot = sheet.snapshot(r("A1:A2"));
        assert!(matches!(
            sheet.paste(&snapshot, at("D1")),
            Err(SheetError::OverlappingMerge { .. })
        ));
        assert_eq!(value(&sheet, "D1"), None);
    }

    #[test]
    fn test_copy_over_whole_merge_suppresses_body_values() {
        let mut sheet = Worksheet::new("S");
        set(&mut sheet, "A1", 1.0);
        set(&mut sheet, "B1", 2.0);
        sheet.merge(r("D1:E1")).unwrap();
        let snapshot = sheet.snapshot(r("A1:B1"));
        sheet.paste(&snapshot, at("D1")).unwrap();
        assert_eq!(value(&sheet, "D1"), Some(CellType::Number(1.0)));
        assert_eq!(value(&sheet, "E1"), None);
        assert_eq!(sheet.merges.ranges(), vec![r("D1:E1")]);
    }

    #[test]
    fn test_copy_out_of_bounds() {
        let sheet = Worksheet::new("S");
        let snapshot = sheet.snapshot(r("A1:B2"));
        let mut target = Worksheet::new("T");
        assert!(matches!(
            target.paste(&snapshot, CellRef::new(MAX_ROW, 1)),
            Err(SheetError::Engine(_))
        ));
    }

    #[test]
    fn test_delete_shift_up_contracts_band() {
        let mut sheet = Worksheet::new("S");
        set(&mut sheet, "A2", 2.0);
        set(&mut sheet, "A3", 3.0);
        set(&mut sheet, "A4", 4.0);
        set(&mut sheet, "B4", 40.0);

        sheet.delete_range(r("A2:A3"), ShiftDirection::Up).unwrap();
        assert_eq!(value(&sheet, "A2"), Some(CellType::Number(4.0)));
        assert_eq!(value(&sheet, "A3"), None);
        assert_eq!(value(&sheet, "A4"), None);
        // Outside the column band nothing moves.
        assert_eq!(value(&sheet, "B4"), Some(CellType::Number(40.0)));
        assert_eq!(sheet.grid.used_range(), Some(r("A2:B4")));
    }

    #[test]
    fn test_delete_shift_left_stays_in_row_band() {
        let mut sheet = Worksheet::new("S");
        set(&mut sheet, "A1", 1.0);
        set(&mut sheet, "B1", 2.0);
        set(&mut sheet, "D1", 4.0);
        set(&mut sheet, "D2", 40.0);

        sheet.delete_range(r("A1:B1"), ShiftDirection::Left).unwrap();
        assert_eq!(value(&sheet, "B1"), Some(CellType::Number(4.0)));
        assert_eq!(value(&sheet, "D1"), None);
        assert_eq!(value(&sheet, "D2"), Some(CellType::Number(40.0)));
    }

    #[test]
    fn test_delete_moves_styles_with_cells() {
        let mut sheet = Worksheet::new("S");
        sheet.grid.update_style(at("A5"), |s| s.font.bold = true);
        sheet.delete_range(r("A1:A2"), ShiftDirection::Up).unwrap();
        assert!(sheet.grid.get(at("A5")).is_none());
        assert!(sheet.grid.get(at("A3")).unwrap().style.as_ref().unwrap().font.bold);
    }

    #[test]
    fn test_delete_that_splits_a_merge_fails_untouched() {
        let mut sheet = Worksheet::new("S");
        set(&mut sheet, "A1", 1.0);
        sheet.merge(r("A3:B3")).unwrap();

        // The merge straddles the column band that would shift up.
        let err = sheet.delete_range(r("A1:A1"), ShiftDirection::Up).unwrap_err();
        assert!(matches!(err, SheetError::MergeSplit(_)));
        assert_eq!(value(&sheet, "A1"), Some(CellType::Number(1.0)));

        // The deleted range cuts through the merge.
        let err = sheet.delete_range(r("B2:B3"), ShiftDirection::Left).unwrap_err();
        assert!(matches!(err, SheetError::MergeSplit(_)));
        assert_eq!(sheet.merges.ranges(), vec![r("A3:B3")]);
    }

    #[test]
    fn test_delete_moves_and_drops_merges() {
        let mut sheet = Worksheet::new("S");
        sheet.merge(r("A1:B1")).unwrap();
        sheet.merge(r("A4:B5")).unwrap();
        sheet.delete_range(r("A1:B2"), ShiftDirection::Up).unwrap();
        assert_eq!(sheet.merges.ranges(), vec![r("A2:B3")]);
    }
}
