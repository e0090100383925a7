//! Rectangular cell ranges.
//!
//! A [`CellRange`] is always normalized (`start <= end` on both axes); the
//! constructors reject anything else rather than silently swapping corners.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cell_ref::CellRef;
use crate::error::{EngineError, Result};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Build a range, failing if `end` precedes `start` on either axis.
    pub fn new(start: CellRef, end: CellRef) -> Result<CellRange> {
        if end.row < start.row || end.col < start.col {
            return Err(EngineError::InvalidRange {
                range: format!("{start}:{end}"),
                reason: "end precedes start".to_string(),
            });
        }
        Ok(CellRange { start, end })
    }

    pub fn single(cell: CellRef) -> CellRange {
        CellRange {
            start: cell,
            end: cell,
        }
    }

    /// Parse a range from its two corner references. A missing end means a
    /// single-cell range.
    pub fn from_corners(start: &str, end: Option<&str>) -> Result<CellRange> {
        let start = CellRef::parse(start)?;
        match end {
            Some(end) if !end.trim().is_empty() => CellRange::new(start, CellRef::parse(end)?),
            _ => Ok(CellRange::single(start)),
        }
    }

    /// Parse `A1:B2` or a bare `A1`.
    pub fn parse(text: &str) -> Result<CellRange> {
        match text.split_once(':') {
            Some((start, end)) => CellRange::from_corners(start, Some(end)),
            None => CellRange::from_corners(text, None),
        }
    }

    /// Parse a range that may carry a sheet qualifier (`Sheet2!A1:B4`,
    /// `'Q1 Sales'!A1:B4`).
    pub fn parse_qualified(text: &str) -> Result<(Option<String>, CellRange)> {
        let Some((sheet, range)) = text.rsplit_once('!') else {
            return Ok((None, CellRange::parse(text)?));
        };
        let sheet = sheet.trim();
        let sheet = sheet
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .map(|s| s.replace("''", "'"))
            .unwrap_or_else(|| sheet.to_string());
        if sheet.is_empty() {
            return Err(EngineError::InvalidRange {
                range: text.to_string(),
                reason: "empty sheet name".to_string(),
            });
        }
        Ok((Some(sheet), CellRange::parse(range)?))
    }

    /// Reject single-cell ranges where the caller needs an area.
    pub fn require_multi_cell(self) -> Result<CellRange> {
        if self.is_single_cell() {
            return Err(EngineError::InvalidRange {
                range: self.to_string(),
                reason: "range must span more than one cell".to_string(),
            });
        }
        Ok(self)
    }

    /// Move the whole range by a signed offset.
    pub fn shift(self, row_offset: i64, col_offset: i64) -> Result<CellRange> {
        let out_of_bounds = || EngineError::OutOfBounds {
            range: self.to_string(),
            row_offset,
            col_offset,
        };
        let start = self
            .start
            .offset(row_offset, col_offset)
            .ok_or_else(out_of_bounds)?;
        let end = self
            .end
            .offset(row_offset, col_offset)
            .ok_or_else(out_of_bounds)?;
        Ok(CellRange { start, end })
    }

    /// Move the range so its top-left corner lands on `anchor`.
    pub fn move_to(self, anchor: CellRef) -> Result<CellRange> {
        self.shift(
            i64::from(anchor.row) - i64::from(self.start.row),
            i64::from(anchor.col) - i64::from(self.start.col),
        )
    }

    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.height()) * u64::from(self.width())
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    pub fn contains_range(&self, other: &CellRange) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// Every address in the range, row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + use<> {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellRef::new(row, col)))
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &CellRange) -> CellRange {
        CellRange {
            start: CellRef::new(
                self.start.row.min(other.start.row),
                self.start.col.min(other.start.col),
            ),
            end: CellRef::new(
                self.end.row.max(other.end.row),
                self.end.col.max(other.end.col),
            ),
        }
    }
}

impl std::str::FromStr for CellRange {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        CellRange::parse(s)
    }
}

impl TryFrom<String> for CellRange {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        CellRange::parse(&value)
    }
}

impl From<CellRange> for String {
    fn from(range: CellRange) -> String {
        range.to_string()
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}
