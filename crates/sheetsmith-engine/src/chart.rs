//! Chart descriptors.
//!
//! A chart is metadata only: which cells feed it, what kind it is and where it
//! sits. Drawing is left to whatever renders the workbook.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::{CellRange, CellRef};
use crate::error::{EngineError, Result};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
    Area,
}

impl ChartKind {
    pub fn as_tag(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
            ChartKind::Area => "area",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "line" => Some(ChartKind::Line),
            "bar" => Some(ChartKind::Bar),
            "pie" => Some(ChartKind::Pie),
            "scatter" => Some(ChartKind::Scatter),
            "area" => Some(ChartKind::Area),
            _ => None,
        }
    }
}

impl FromStr for ChartKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        ChartKind::from_tag(s).ok_or_else(|| EngineError::UnsupportedChartType(s.to_string()))
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A chart placed on a worksheet. `data_range` is referenced, not copied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub id: u32,
    pub kind: ChartKind,
    /// Sheet holding the data when it differs from the sheet the chart sits on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_sheet: Option<String>,
    pub data_range: CellRange,
    pub anchor: CellRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
}

impl ChartDescriptor {
    /// Check the data shape fits the chart kind.
    pub fn validate(&self) -> Result<()> {
        if self.kind == ChartKind::Scatter && self.data_range.width() < 2 {
            return Err(EngineError::InvalidRange {
                range: self.data_range.to_string(),
                reason: "scatter charts need an x column and at least one y column".to_string(),
            });
        }
        Ok(())
    }
}
