//! Pivot tables: group the rows of a headed range and aggregate value fields.
//!
//! The output is a literal grid. Nothing links it back to the source, so
//! later edits to the source do not refresh it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sheetsmith_engine::EngineError;
use sheetsmith_engine::engine::{CellRange, CellRef, CellType};

use crate::error::{Result, SheetError};
use crate::sheet::Worksheet;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    Sum,
    Count,
    #[default]
    Average,
    Max,
    Min,
}

impl AggFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Count => "count",
            AggFunc::Average => "average",
            AggFunc::Max => "max",
            AggFunc::Min => "min",
        }
    }
}

impl FromStr for AggFunc {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggFunc::Sum),
            "count" => Ok(AggFunc::Count),
            "average" | "mean" | "avg" => Ok(AggFunc::Average),
            "max" => Ok(AggFunc::Max),
            "min" => Ok(AggFunc::Min),
            _ => Err(SheetError::UnsupportedAggregation(s.to_string())),
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to pivot and where to put it.
#[derive(Clone, Debug)]
pub struct PivotRequest {
    pub source: CellRange,
    pub rows: Vec<String>,
    pub values: Vec<String>,
    pub columns: Vec<String>,
    pub agg: AggFunc,
    pub target: CellRef,
}

/// Where the pivot landed and which keys it produced, in output order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PivotSummary {
    pub output_range: CellRange,
    pub row_keys: Vec<Vec<String>>,
    pub column_keys: Vec<Vec<String>>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Accumulator {
    entries: usize,
    numeric: usize,
    sum: f64,
    max: f64,
    min: f64,
}

impl Accumulator {
    fn push(&mut self, n: f64) {
        if self.numeric == 0 {
            self.max = n;
            self.min = n;
        } else {
            self.max = self.max.max(n);
            self.min = self.min.min(n);
        }
        self.numeric += 1;
        self.sum += n;
    }

    /// `None` when nothing numeric was seen. The value may be non-finite if
    /// the running sum overflowed.
    fn finish(&self, agg: AggFunc) -> Option<f64> {
        match agg {
            AggFunc::Count => Some(self.entries as f64),
            _ if self.numeric == 0 => None,
            AggFunc::Sum => Some(self.sum),
            AggFunc::Average => Some(self.sum / self.numeric as f64),
            AggFunc::Max => Some(self.max),
            AggFunc::Min => Some(self.min),
        }
    }
}

/// Distinct keys in first-seen order.
#[derive(Default)]
struct KeyOrder {
    keys: Vec<Vec<String>>,
    first_cells: Vec<Vec<CellType>>,
    index: HashMap<Vec<String>, usize>,
}

impl KeyOrder {
    fn slot(&mut self, cells: Vec<CellType>) -> usize {
        let key: Vec<String> = cells.iter().map(CellType::display).collect();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.keys.len();
        self.index.insert(key.clone(), idx);
        self.keys.push(key);
        self.first_cells.push(cells);
        idx
    }
}

fn numeric_value(contents: &CellType) -> Option<f64> {
    match contents {
        CellType::Number(n) => Some(*n),
        CellType::Text(t) => t.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

impl Worksheet {
    fn contents_at(&self, at: CellRef) -> CellType {
        self.grid
            .get(at)
            .map(|cell| cell.contents.clone())
            .unwrap_or_default()
    }

    fn field_columns(&self, request: &PivotRequest, fields: &[String]) -> Result<Vec<u32>> {
        let header_row = request.source.start.row;
        let headers: Vec<String> = (request.source.start.col..=request.source.end.col)
            .map(|col| {
                self.contents_at(CellRef::new(header_row, col))
                    .display()
                    .trim()
                    .to_string()
            })
            .collect();
        fields
            .iter()
            .map(|field| {
                headers
                    .iter()
                    .position(|h| h == field.trim())
                    .map(|idx| request.source.start.col + idx as u32)
                    .ok_or_else(|| {
                        SheetError::InvalidPivot(format!(
                            "field '{field}' is not in the header row of {}",
                            request.source
                        ))
                    })
            })
            .collect()
    }

    /// Build a pivot table from `request.source` and write it at
    /// `request.target`. All aggregation happens before any cell is written.
    pub fn build_pivot(&mut self, request: &PivotRequest) -> Result<PivotSummary> {
        if request.rows.is_empty() {
            return Err(SheetError::InvalidPivot("no row fields given".to_string()));
        }
        if request.values.is_empty() {
            return Err(SheetError::InvalidPivot("no value fields given".to_string()));
        }
        if request.source.height() < 2 {
            return Err(SheetError::InvalidPivot(format!(
                "{} needs a header row and at least one data row",
                request.source
            )));
        }

        let row_cols = self.field_columns(request, &request.rows)?;
        let value_cols = self.field_columns(request, &request.values)?;
        let column_cols = self.field_columns(request, &request.columns)?;

        let mut row_keys = KeyOrder::default();
        let mut column_keys = KeyOrder::default();
        let mut groups: HashMap<(usize, usize, usize), Accumulator> = HashMap::new();

        for row in request.source.start.row + 1..=request.source.end.row {
            let key_of = |cols: &[u32]| -> Vec<CellType> {
                cols.iter()
                    .map(|&col| self.contents_at(CellRef::new(row, col)))
                    .collect()
            };
            let row_cells = key_of(&row_cols);
            let column_cells = key_of(&column_cols);
            let blank = row_cells.iter().chain(&column_cells).all(CellType::is_empty)
                && key_of(&value_cols).iter().all(CellType::is_empty);
            if blank {
                continue;
            }
            let r = row_keys.slot(row_cells);
            let c = column_keys.slot(column_cells);

            for (v, &col) in value_cols.iter().enumerate() {
                let at = CellRef::new(row, col);
                let contents = self.contents_at(at);
                let acc = groups.entry((r, c, v)).or_default();
                if contents.is_empty() {
                    continue;
                }
                acc.entries += 1;
                if request.agg == AggFunc::Count {
                    continue;
                }
                match numeric_value(&contents) {
                    Some(n) => acc.push(n),
                    None => {
                        return Err(SheetError::NonNumericAggregation {
                            field: request.values[v].clone(),
                            value: contents.display(),
                            cell: at.to_string(),
                        });
                    }
                }
            }
        }

        if row_keys.keys.is_empty() {
            return Err(SheetError::InvalidPivot(format!(
                "{} has no non-blank data rows",
                request.source
            )));
        }

        let has_column_fields = !request.columns.is_empty();
        let header_rows: u32 = if has_column_fields { 2 } else { 1 };
        let width = request.rows.len() + column_keys.keys.len() * request.values.len();
        let height = header_rows as usize + row_keys.keys.len();
        let output = CellRange::new(
            CellRef::new(1, 1),
            CellRef::new(height as u32, width as u32),
        )?
        .move_to(request.target)?;

        if output.intersects(&request.source) {
            return Err(EngineError::InvalidRange {
                range: output.to_string(),
                reason: format!("pivot output overlaps its source {}", request.source),
            }
            .into());
        }
        if let Some(existing) = self.merges.intersecting(&output).first() {
            return Err(SheetError::OverlappingMerge {
                range: output.to_string(),
                existing: existing.to_string(),
            });
        }

        let mut grid: Vec<Vec<CellType>> = Vec::with_capacity(height);
        let value_label =
            |v: usize| CellType::Text(format!("{} ({})", request.values[v], request.agg));
        if has_column_fields {
            let mut top = vec![CellType::Empty; request.rows.len()];
            let mut labels: Vec<CellType> =
                request.rows.iter().map(|f| CellType::Text(f.clone())).collect();
            for key in &column_keys.keys {
                for v in 0..request.values.len() {
                    top.push(CellType::Text(key.join(" / ")));
                    labels.push(value_label(v));
                }
            }
            grid.push(top);
            grid.push(labels);
        } else {
            let mut labels: Vec<CellType> =
                request.rows.iter().map(|f| CellType::Text(f.clone())).collect();
            labels.extend((0..request.values.len()).map(value_label));
            grid.push(labels);
        }
        for (r, key_cells) in row_keys.first_cells.iter().enumerate() {
            let mut line = key_cells.clone();
            for c in 0..column_keys.keys.len() {
                for v in 0..request.values.len() {
                    let cell = match groups.get(&(r, c, v)).and_then(|acc| acc.finish(request.agg)) {
                        Some(value) if !value.is_finite() => {
                            return Err(SheetError::InvalidPivot(format!(
                                "{} of field '{}' for '{}' overflows",
                                request.agg,
                                request.values[v],
                                row_keys.keys[r].join(" / ")
                            )));
                        }
                        Some(value) => CellType::Number(value),
                        None if request.agg == AggFunc::Count => CellType::Number(0.0),
                        None => CellType::Empty,
                    };
                    line.push(cell);
                }
            }
            grid.push(line);
        }

        for (dr, line) in grid.into_iter().enumerate() {
            for (dc, contents) in line.into_iter().enumerate() {
                let at = CellRef::new(
                    output.start.row + dr as u32,
                    output.start.col + dc as u32,
                );
                self.grid.set(at, contents, None);
            }
        }
        log::debug!(
            "pivot of {} on '{}' written to {}",
            request.source,
            self.name,
            output
        );

        Ok(PivotSummary {
            output_range: output,
            row_keys: row_keys.keys,
            column_keys: if has_column_fields {
                column_keys.keys
            } else {
                Vec::new()
            },
        })
    }
}
