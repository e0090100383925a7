//! Merge groups and their overlap index.
//!
//! Groups are bucketed by row band so an overlap query only looks at groups
//! near the queried rows instead of every group on the sheet.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sheetsmith_engine::engine::{CellRange, CellRef};

use super::Worksheet;
use crate::error::{Result, SheetError};

const BUCKET_ROWS: u32 = 64;

fn buckets(range: &CellRange) -> std::ops::RangeInclusive<u32> {
    (range.start.row / BUCKET_ROWS)..=(range.end.row / BUCKET_ROWS)
}

/// Non-overlapping merge groups of one sheet.
#[derive(Clone, Debug, Default)]
pub struct MergeIndex {
    next_id: u64,
    groups: BTreeMap<u64, CellRange>,
    by_bucket: HashMap<u32, BTreeSet<u64>>,
}

impl MergeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups intersecting `range`, in top-left order.
    pub fn intersecting(&self, range: &CellRange) -> Vec<CellRange> {
        let mut ids = BTreeSet::new();
        for bucket in buckets(range) {
            if let Some(in_bucket) = self.by_bucket.get(&bucket) {
                ids.extend(in_bucket.iter().copied());
            }
        }
        let mut hits: Vec<CellRange> = ids
            .into_iter()
            .filter_map(|id| self.groups.get(&id))
            .filter(|group| group.intersects(range))
            .copied()
            .collect();
        hits.sort();
        hits
    }

    /// The group a cell belongs to, if any.
    pub fn group_of(&self, cell: CellRef) -> Option<CellRange> {
        self.intersecting(&CellRange::single(cell)).into_iter().next()
    }

    pub fn insert(&mut self, range: CellRange) -> Result<()> {
        if let Some(existing) = self.intersecting(&range).first() {
            return Err(SheetError::OverlappingMerge {
                range: range.to_string(),
                existing: existing.to_string(),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.groups.insert(id, range);
        for bucket in buckets(&range) {
            self.by_bucket.entry(bucket).or_default().insert(id);
        }
        Ok(())
    }

    /// Remove the group exactly matching `range`.
    pub fn remove(&mut self, range: &CellRange) -> Result<()> {
        let id = self
            .groups
            .iter()
            .find(|(_, group)| *group == range)
            .map(|(id, _)| *id)
            .ok_or_else(|| SheetError::MergeNotFound(range.to_string()))?;
        self.groups.remove(&id);
        for bucket in buckets(range) {
            if let Some(in_bucket) = self.by_bucket.get_mut(&bucket) {
                in_bucket.remove(&id);
                if in_bucket.is_empty() {
                    self.by_bucket.remove(&bucket);
                }
            }
        }
        Ok(())
    }

    /// All groups, sorted top-left first.
    pub fn ranges(&self) -> Vec<CellRange> {
        let mut all: Vec<CellRange> = self.groups.values().copied().collect();
        all.sort();
        all
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Worksheet {
    /// Merge a range. The anchor keeps its value; the other cells lose theirs
    /// but keep their styles.
    pub fn merge(&mut self, range: CellRange) -> Result<()> {
        let range = range.require_multi_cell()?;
        self.merges.insert(range)?;
        let hidden: Vec<CellRef> = self
            .grid
            .iterate(range)
            .map(|(at, _)| at)
            .filter(|at| *at != range.start)
            .collect();
        for cell in hidden {
            self.grid.clear_value(cell);
        }
        log::debug!("merged {} on '{}'", range, self.name);
        Ok(())
    }

    /// Remove the merge group exactly matching `range`. Cleared values stay
    /// cleared.
    pub fn unmerge(&mut self, range: CellRange) -> Result<()> {
        self.merges.remove(&range)?;
        log::debug!("unmerged {} on '{}'", range, self.name);
        Ok(())
    }

    /// Fail if a value may not be stored at `cell` (non-anchor merged cell).
    pub(crate) fn ensure_writable(&self, cell: CellRef) -> Result<()> {
        match self.merges.group_of(cell) {
            Some(group) if group.start != cell => Err(SheetError::MergedCell(cell.to_string())),
            _ => Ok(()),
        }
    }
}
