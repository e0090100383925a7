//! Cell data structures.
//!
//! - [`CellType`] - what a cell holds: nothing, a literal, or formula text
//! - [`Cell`] - contents plus an optional per-cell [`Style`]

use serde::{Deserialize, Serialize};

use super::style::Style;

/// The content stored in a cell. A cell holds at most one literal or one
/// formula, never both.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellType {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Raw formula text including the leading `=`; never evaluated here.
    Formula(String),
}

impl CellType {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellType::Empty)
    }

    /// Text used for pivot keys, headers and plain-text display.
    pub fn display(&self) -> String {
        match self {
            CellType::Empty => String::new(),
            CellType::Text(s) => s.clone(),
            CellType::Number(n) => format_number(*n),
            CellType::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellType::Formula(f) => f.clone(),
        }
    }
}

/// Format a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A cell in a worksheet grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub contents: CellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

impl Cell {
    /// True when the cell carries neither content nor a style worth keeping.
    pub fn is_blank(&self) -> bool {
        self.contents.is_empty() && self.style.as_ref().is_none_or(Style::is_default)
    }
}
