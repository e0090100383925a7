//! Worksheet state and the operations that act on a single sheet.

mod edit;
mod format;
mod formula;
mod grid;
mod merge;

pub use edit::{RangeSnapshot, ShiftDirection};
pub use format::{ConditionalFormat, FormatOptions, ResolvedFormat};
pub use grid::GridStore;
pub use merge::MergeIndex;

use sheetsmith_engine::chart::ChartDescriptor;

/// One named sheet: its cells, merge groups, charts and conditional rules.
#[derive(Clone, Debug)]
pub struct Worksheet {
    pub name: String,
    pub grid: GridStore,
    pub merges: MergeIndex,
    pub charts: Vec<ChartDescriptor>,
    pub conditional_formats: Vec<ConditionalFormat>,
}

impl Worksheet {
    pub fn new(name: &str) -> Self {
        Worksheet {
            name: name.to_string(),
            grid: GridStore::new(),
            merges: MergeIndex::new(),
            charts: Vec::new(),
            conditional_formats: Vec::new(),
        }
    }

    pub(crate) fn next_chart_id(&self) -> u32 {
        self.charts.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }
}
