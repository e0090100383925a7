//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and one-based row/column coordinates.
//!
//! # Examples
//!
//! ```
//! use sheetsmith_engine::engine::CellRef;
//!
//! let cell: CellRef = "B3".parse().unwrap();
//! assert_eq!(cell.col, 2);
//! assert_eq!(cell.row, 3);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{EngineError, Result};

/// Last addressable row of an xlsx sheet.
pub const MAX_ROW: u32 = 1_048_576;
/// Last addressable column of an xlsx sheet (`XFD`).
pub const MAX_COL: u32 = 16_384;

/// A reference to a cell by one-based row and column.
///
/// Field order makes the derived `Ord` row-major, which the grid store
/// relies on for its iteration order.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from A1 notation.
    pub fn parse(name: &str) -> Result<CellRef> {
        Self::parse_a1(name).ok_or_else(|| EngineError::InvalidReference(name.to_string()))
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let col = letters_to_col(letters)?;
        let row = numbers.parse::<u32>().ok()?;
        if row > MAX_ROW {
            return None;
        }

        Some(CellRef::new(row, col))
    }

    /// Convert a one-based column index to letters (1 -> A, 26 -> Z, 27 -> AA).
    pub fn col_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Move the reference by a signed offset, failing if it leaves the sheet.
    pub fn offset(self, row_offset: i64, col_offset: i64) -> Option<CellRef> {
        let row = i64::from(self.row) + row_offset;
        let col = i64::from(self.col) + col_offset;
        if row < 1 || col < 1 || row > i64::from(MAX_ROW) || col > i64::from(MAX_COL) {
            return None;
        }
        Some(CellRef::new(row as u32, col as u32))
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[1-9][0-9]*)$")
            .expect("A1 reference regex must compile")
    })
}

fn letters_to_col(letters: &str) -> Option<u32> {
    let mut acc = 0u32;
    for c in letters.to_ascii_uppercase().bytes() {
        let digit = u32::from(c - b'A') + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
        if acc > MAX_COL {
            return None;
        }
    }
    Some(acc)
}

impl std::str::FromStr for CellRef {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CellRef {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        CellRef::parse(&value)
    }
}

impl From<CellRef> for String {
    fn from(cell: CellRef) -> String {
        cell.to_string()
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_single_and_multi_letter_columns() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef::new(1, 1));
        assert_eq!(CellRef::parse("Z1").unwrap(), CellRef::new(1, 26));
        assert_eq!(CellRef::parse("AA1").unwrap(), CellRef::new(1, 27));
        assert_eq!(CellRef::parse("AZ1").unwrap(), CellRef::new(1, 52));
        assert_eq!(CellRef::parse("BA10").unwrap(), CellRef::new(10, 53));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(CellRef::parse("b2").unwrap(), CellRef::new(2, 2));
        assert_eq!(CellRef::parse("aA1").unwrap(), CellRef::new(1, 27));
    }

    #[test]
    fn test_parse_invalid_inputs() {
        for bad in ["", "123", "ABC", "A0", "1A", "A 1", "A01", "$A$1", "A1B", " A1", "A1 "] {
            assert_eq!(
                CellRef::parse(bad),
                Err(EngineError::InvalidReference(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_beyond_sheet_limits() {
        assert!(CellRef::parse("XFD1048576").is_ok());
        assert!(CellRef::parse("XFE1").is_err());
        assert!(CellRef::parse("A1048577").is_err());
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::parse(&huge).is_err());
    }

    #[test]
    fn test_offset() {
        let b2 = CellRef::new(2, 2);
        assert_eq!(b2.offset(-1, -1), Some(CellRef::new(1, 1)));
        assert_eq!(b2.offset(-2, 0), None);
        assert_eq!(b2.offset(0, 3), Some(CellRef::new(2, 5)));
    }

    #[test]
    fn test_row_major_ordering() {
        let mut refs = vec![CellRef::new(2, 1), CellRef::new(1, 3), CellRef::new(1, 2)];
        refs.sort();
        assert_eq!(
            refs,
            vec![CellRef::new(1, 2), CellRef::new(1, 3), CellRef::new(2, 1)]
        );
    }

    proptest! {
        #[test]
        fn prop_format_then_parse_round_trips(row in 1u32..=MAX_ROW, col in 1u32..=MAX_COL) {
            let text = CellRef::new(row, col).to_string();
            prop_assert_eq!(CellRef::parse(&text).unwrap(), CellRef::new(row, col));
        }
    }
}
