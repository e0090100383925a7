//! Storing formula text on a worksheet.
//!
//! Formulas are checked for syntax only and kept as text. Nothing here
//! evaluates them.

use sheetsmith_engine::engine::{CellRef, CellType, FormulaCheck, validate_formula};

use super::Worksheet;
use crate::error::{Result, SheetError};

impl Worksheet {
    /// Validate formula text and store it on `cell`, replacing any literal.
    /// The cell's style is kept. Nothing is evaluated.
    pub fn apply_formula(&mut self, cell: CellRef, text: &str) -> Result<FormulaCheck> {
        let check = validate_formula(text);
        if !check.valid {
            return Err(SheetError::InvalidFormula {
                formula: text.to_string(),
                reason: check.reason.clone().unwrap_or_default(),
            });
        }
        self.ensure_writable(cell)?;
        for warning in &check.warnings {
            log::warn!("{} on '{}': {}", cell, self.name, warning);
        }
        self.grid
            .set(cell, CellType::Formula(text.trim().to_string()), None);
        Ok(check)
    }
}
