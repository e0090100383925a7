//! Sparse cell storage for one worksheet.

use std::collections::BTreeMap;

use sheetsmith_engine::engine::{Cell, CellRange, CellRef, CellType, Style};

/// Cells keyed by address. Absent keys are empty cells; the map is ordered
/// row-major so iteration order is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridStore {
    cells: BTreeMap<CellRef, Cell>,
}

impl GridStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, at: CellRef) -> Option<&Cell> {
        self.cells.get(&at)
    }

    /// Replace the contents of a cell. `style: None` keeps whatever style the
    /// cell already had.
    pub fn set(&mut self, at: CellRef, contents: CellType, style: Option<Style>) {
        let cell = self.cells.entry(at).or_default();
        cell.contents = contents;
        if style.is_some() {
            cell.style = style;
        }
        if cell.is_blank() {
            self.cells.remove(&at);
        }
    }

    /// Store a whole cell record, dropping it if it carries nothing.
    pub fn put(&mut self, at: CellRef, cell: Cell) {
        if cell.is_blank() {
            self.cells.remove(&at);
        } else {
            self.cells.insert(at, cell);
        }
    }

    /// Clear the contents of a cell but keep its style.
    pub fn clear_value(&mut self, at: CellRef) {
        if let Some(cell) = self.cells.get_mut(&at) {
            cell.contents = CellType::Empty;
            if cell.is_blank() {
                self.cells.remove(&at);
            }
        }
    }

    pub fn remove(&mut self, at: CellRef) -> Option<Cell> {
        self.cells.remove(&at)
    }

    /// Mutate the style of a cell, creating a style-only cell when needed.
    pub fn update_style(&mut self, at: CellRef, update: impl FnOnce(&mut Style)) {
        let cell = self.cells.entry(at).or_default();
        update(cell.style.get_or_insert_with(Style::default));
        if cell.is_blank() {
            self.cells.remove(&at);
        }
    }

    /// Stored cells inside `range`, row-major. Each call starts a fresh walk.
    pub fn iterate(&self, range: CellRange) -> impl Iterator<Item = (CellRef, &Cell)> + '_ {
        (range.start.row..=range.end.row).flat_map(move |row| {
            self.cells
                .range(CellRef::new(row, range.start.col)..=CellRef::new(row, range.end.col))
                .map(|(at, cell)| (*at, cell))
        })
    }

    /// Every stored cell, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (CellRef, &Cell)> + '_ {
        self.cells.iter().map(|(at, cell)| (*at, cell))
    }

    /// Addresses of stored cells matching a predicate.
    pub(crate) fn keys_where(&self, mut keep: impl FnMut(CellRef) -> bool) -> Vec<CellRef> {
        self.cells.keys().copied().filter(|at| keep(*at)).collect()
    }

    /// Minimal bounding box of cells with content, or `None` for an empty sheet.
    pub fn used_range(&self) -> Option<CellRange> {
        let mut bounds: Option<CellRange> = None;
        for (at, cell) in &self.cells {
            if cell.contents.is_empty() {
                continue;
            }
            let here = CellRange::single(*at);
            bounds = Some(match bounds {
                Some(b) => b.union(&here),
                None => here,
            });
        }
        bounds
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
