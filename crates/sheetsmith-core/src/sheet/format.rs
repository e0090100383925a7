//! Range formatting.
//!
//! A [`FormatOptions`] request is resolved into a [`ResolvedFormat`] before
//! any cell is touched, so a bad color or alignment leaves the sheet as it was.

use serde::{Deserialize, Serialize};

use sheetsmith_engine::engine::{
    Alignment, BorderEdge, BorderStyle, Borders, CellRange, Color, Protection, Style,
};

use super::Worksheet;
use crate::error::{Result, SheetError};

/// Formatting requested for a range. Every field is optional; `None` leaves
/// the corresponding attribute untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatOptions {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub font_size: Option<f64>,
    pub font_color: Option<String>,
    pub bg_color: Option<String>,
    pub border_style: Option<String>,
    pub border_color: Option<String>,
    pub number_format: Option<String>,
    pub alignment: Option<String>,
    pub wrap_text: Option<bool>,
    pub merge_cells: bool,
    pub protection: Option<Protection>,
    pub conditional_format: Option<ConditionalFormatRequest>,
}

/// A conditional rule as requested by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConditionalFormatRequest {
    #[serde(alias = "type")]
    pub rule_type: String,
    pub criteria: serde_json::Value,
    #[serde(alias = "format")]
    pub target_style: Option<Box<FormatOptions>>,
}

/// A conditional rule attached to a range. The renderer evaluates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionalFormat {
    pub range: CellRange,
    pub rule_type: String,
    #[serde(default)]
    pub criteria: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

/// Validated formatting, ready to apply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedFormat {
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    font_size: Option<f64>,
    font_color: Option<Color>,
    fill: Option<Color>,
    border: Option<BorderEdge>,
    number_format: Option<String>,
    alignment: Option<Alignment>,
    wrap_text: Option<bool>,
    protection: Option<Protection>,
    merge: bool,
    conditional: Option<(String, serde_json::Value, Option<Style>)>,
}

fn parse_color(text: Option<&str>) -> Result<Option<Color>> {
    Ok(text.map(Color::parse).transpose()?)
}

impl FormatOptions {
    pub fn resolve(&self) -> Result<ResolvedFormat> {
        let border_color = parse_color(self.border_color.as_deref())?;
        let border = match (&self.border_style, border_color) {
            (Some(style), color) => Some(BorderEdge {
                style: style.parse::<BorderStyle>()?,
                color,
            }),
            (None, Some(color)) => Some(BorderEdge {
                style: BorderStyle::Thin,
                color: Some(color),
            }),
            (None, None) => None,
        };

        let conditional = match &self.conditional_format {
            Some(rule) => {
                let style = match &rule.target_style {
                    Some(target) => {
                        let mut style = Style::default();
                        target.resolve()?.apply_to(&mut style);
                        Some(style)
                    }
                    None => None,
                };
                Some((rule.rule_type.clone(), rule.criteria.clone(), style))
            }
            None => None,
        };

        Ok(ResolvedFormat {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            font_size: self.font_size,
            font_color: parse_color(self.font_color.as_deref())?,
            fill: parse_color(self.bg_color.as_deref())?,
            border,
            number_format: self.number_format.clone(),
            alignment: self
                .alignment
                .as_deref()
                .map(str::parse::<Alignment>)
                .transpose()?,
            wrap_text: self.wrap_text,
            protection: self.protection,
            merge: self.merge_cells,
            conditional,
        })
    }
}

impl ResolvedFormat {
    /// Whether any per-cell attribute was requested.
    fn touches_cells(&self) -> bool {
        self.bold.is_some()
            || self.italic.is_some()
            || self.underline.is_some()
            || self.font_size.is_some()
            || self.font_color.is_some()
            || self.fill.is_some()
            || self.border.is_some()
            || self.number_format.is_some()
            || self.alignment.is_some()
            || self.wrap_text.is_some()
            || self.protection.is_some()
    }

    /// Overwrite the requested attributes of one style record.
    pub fn apply_to(&self, style: &mut Style) {
        if let Some(bold) = self.bold {
            style.font.bold = bold;
        }
        if let Some(italic) = self.italic {
            style.font.italic = italic;
        }
        if let Some(underline) = self.underline {
            style.font.underline = underline;
        }
        if let Some(size) = self.font_size {
            style.font.size = Some(size);
        }
        if let Some(color) = &self.font_color {
            style.font.color = Some(color.clone());
        }
        if let Some(fill) = &self.fill {
            style.fill = Some(fill.clone());
        }
        if let Some(edge) = &self.border {
            style.borders = Borders::uniform(edge.clone());
        }
        if let Some(pattern) = &self.number_format {
            style.number_format = Some(pattern.clone());
        }
        match self.alignment {
            Some(Alignment::Horizontal(h)) => style.horizontal = Some(h),
            Some(Alignment::Vertical(v)) => style.vertical = Some(v),
            None => {}
        }
        if let Some(wrap) = self.wrap_text {
            style.wrap_text = wrap;
        }
        if let Some(protection) = self.protection {
            style.protection = Some(protection);
        }
    }
}

impl Worksheet {
    /// Apply formatting to every cell of `range`, then merge it if requested.
    pub fn apply_format(&mut self, range: CellRange, options: &FormatOptions) -> Result<()> {
        let format = options.resolve()?;
        if format.merge {
            // Check up front so a failed merge leaves styles untouched.
            let range = range.require_multi_cell()?;
            if let Some(existing) = self.merges.intersecting(&range).first() {
                return Err(SheetError::OverlappingMerge {
                    range: range.to_string(),
                    existing: existing.to_string(),
                });
            }
        }

        if format.touches_cells() {
            for cell in range.cells() {
                self.grid.update_style(cell, |style| format.apply_to(style));
            }
        }

        if let Some((rule_type, criteria, style)) = &format.conditional {
            let rule = ConditionalFormat {
                range,
                rule_type: rule_type.clone(),
                criteria: criteria.clone(),
                style: style.clone(),
            };
            if !self.conditional_formats.contains(&rule) {
                self.conditional_formats.push(rule);
            }
        }

        if format.merge {
            self.merge(range)?;
        }
        log::debug!("formatted {} on '{}'", range, self.name);
        Ok(())
    }
}
