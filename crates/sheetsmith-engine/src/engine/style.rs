//! Per-cell style records.
//!
//! Styles are plain values owned by each cell. Two cells formatted the same
//! way hold equal but independent records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// An RGB color normalized to six uppercase hex digits (no leading `#`).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "000000"),
    ("white", "FFFFFF"),
    ("red", "FF0000"),
    ("green", "008000"),
    ("lime", "00FF00"),
    ("blue", "0000FF"),
    ("navy", "000080"),
    ("yellow", "FFFF00"),
    ("orange", "FFA500"),
    ("purple", "800080"),
    ("magenta", "FF00FF"),
    ("cyan", "00FFFF"),
    ("teal", "008080"),
    ("gray", "808080"),
    ("grey", "808080"),
    ("silver", "C0C0C0"),
    ("maroon", "800000"),
    ("olive", "808000"),
    ("brown", "A52A2A"),
    ("pink", "FFC0CB"),
];

impl Color {
    pub fn parse(text: &str) -> Result<Color> {
        let trimmed = text.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == lowered) {
            return Ok(Color((*hex).to_string()));
        }
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Color(hex.to_ascii_uppercase()));
        }
        Err(EngineError::InvalidColor(text.to_string()))
    }

    pub fn hex(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Color {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> String {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Font {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Line styles accepted for cell borders (the xlsx set).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BorderStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl FromStr for BorderStyle {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let style = match s.trim().to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "thin" => BorderStyle::Thin,
            "medium" => BorderStyle::Medium,
            "thick" => BorderStyle::Thick,
            "dashed" => BorderStyle::Dashed,
            "dotted" => BorderStyle::Dotted,
            "double" => BorderStyle::Double,
            "hair" => BorderStyle::Hair,
            "mediumdashed" => BorderStyle::MediumDashed,
            "dashdot" => BorderStyle::DashDot,
            "mediumdashdot" => BorderStyle::MediumDashDot,
            "dashdotdot" => BorderStyle::DashDotDot,
            "mediumdashdotdot" => BorderStyle::MediumDashDotDot,
            "slantdashdot" => BorderStyle::SlantDashDot,
            _ => return Err(EngineError::InvalidBorderStyle(s.to_string())),
        };
        Ok(style)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorderEdge {
    pub style: BorderStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Borders {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
}

impl Borders {
    /// The same edge on all four sides.
    pub fn uniform(edge: BorderEdge) -> Borders {
        Borders {
            left: Some(edge.clone()),
            right: Some(edge.clone()),
            top: Some(edge.clone()),
            bottom: Some(edge),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    Top,
    Middle,
    Bottom,
}

/// A requested alignment; each value sets one axis and leaves the other alone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Alignment {
    Horizontal(HorizontalAlignment),
    Vertical(VerticalAlignment),
}

impl FromStr for Alignment {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let alignment = match s.trim().to_ascii_lowercase().as_str() {
            "left" => Alignment::Horizontal(HorizontalAlignment::Left),
            "center" => Alignment::Horizontal(HorizontalAlignment::Center),
            "right" => Alignment::Horizontal(HorizontalAlignment::Right),
            "justify" => Alignment::Horizontal(HorizontalAlignment::Justify),
            "top" => Alignment::Vertical(VerticalAlignment::Top),
            "middle" => Alignment::Vertical(VerticalAlignment::Middle),
            "bottom" => Alignment::Vertical(VerticalAlignment::Bottom),
            _ => return Err(EngineError::InvalidAlignment(s.to_string())),
        };
        Ok(alignment)
    }
}

#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Protection {
    pub locked: bool,
    pub hidden: bool,
}

/// Everything the renderer needs to draw one cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub font: Font,
    pub borders: Borders,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<HorizontalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalAlignment>,
    pub wrap_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection: Option<Protection>,
}

impl Style {
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }
}
