//! Chart binder: ties a data range and chart kind to an anchor cell.

use sheetsmith_engine::chart::{ChartDescriptor, ChartKind};
use sheetsmith_engine::engine::{CellRange, CellRef};

use crate::error::{Result, SheetError};
use crate::workbook::Workbook;

/// Optional labels for a chart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChartLabels {
    pub title: Option<String>,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
}

impl Workbook {
    /// Place a chart on `sheet`. `data_range` may name another sheet
    /// (`Data!A1:B5`), which must exist. No data is copied.
    pub fn create_chart(
        &mut self,
        sheet: &str,
        data_range: &str,
        kind: ChartKind,
        anchor: CellRef,
        labels: ChartLabels,
    ) -> Result<ChartDescriptor> {
        let (data_sheet, range) = CellRange::parse_qualified(data_range)?;
        let data_sheet = data_sheet.filter(|name| name != sheet);
        if let Some(name) = &data_sheet {
            if !self.contains(name) {
                return Err(SheetError::NotFound(format!("Sheet '{name}'")));
            }
        }

        let target = self.sheet_mut(sheet)?;
        let descriptor = ChartDescriptor {
            id: target.next_chart_id(),
            kind,
            data_sheet,
            data_range: range,
            anchor,
            title: labels.title,
            x_axis: labels.x_axis,
            y_axis: labels.y_axis,
        };
        descriptor.validate()?;
        log::debug!("{} chart {} on '{}' at {}", kind, descriptor.id, sheet, anchor);
        target.charts.push(descriptor.clone());
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetsmith_engine::EngineError;

    #[test]
    fn test_chart_references_data_without_copying() {
        let mut wb = Workbook::new("Sheet1").unwrap();
        let chart = wb
            .create_chart(
                "Sheet1",
                "A1:B5",
                ChartKind::Line,
                CellRef::new(1, 4),
                ChartLabels {
                    title: Some("Sales".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(chart.id, 1);
        assert_eq!(chart.data_sheet, None);
        assert_eq!(chart.title.as_deref(), Some("Sales"));
        let sheet = wb.sheet("Sheet1").unwrap();
        assert_eq!(sheet.charts.len(), 1);
        assert!(sheet.grid.is_empty());
    }

    #[test]
    fn test_ids_increase_per_sheet() {
        let mut wb = Workbook::new("Sheet1").unwrap();
        for _ in 0..2 {
            wb.create_chart(
                "Sheet1",
                "A1:A3",
                ChartKind::Bar,
                CellRef::new(1, 3),
                ChartLabels::default(),
            )
            .unwrap();
        }
        let ids: Vec<u32> = wb.sheet("Sheet1").unwrap().charts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_qualified_data_sheet_must_exist() {
        let mut wb = Workbook::new("Report").unwrap();
        assert!(matches!(
            wb.create_chart(
                "Report",
                "'Raw Data'!A1:B3",
                ChartKind::Pie,
                CellRef::new(1, 1),
                ChartLabels::default()
            ),
            Err(SheetError::NotFound(_))
        ));
        wb.add_sheet("Raw Data").unwrap();
        let chart = wb
            .create_chart(
                "Report",
                "'Raw Data'!A1:B3",
                ChartKind::Pie,
                CellRef::new(1, 1),
                ChartLabels::default(),
            )
            .unwrap();
        assert_eq!(chart.data_sheet.as_deref(), Some("Raw Data"));
    }

    #[test]
    fn test_scatter_needs_two_columns() {
        let mut wb = Workbook::new("Sheet1").unwrap();
        let err = wb
            .create_chart(
                "Sheet1",
                "A1:A9",
                ChartKind::Scatter,
                CellRef::new(1, 3),
                ChartLabels::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SheetError::Engine(EngineError::InvalidRange { .. })
        ));
        assert!(wb.sheet("Sheet1").unwrap().charts.is_empty());
    }
}
