//! Per-series style records, kept in lock-step with the Y-axis selection.

use serde::{Deserialize, Serialize};

use crate::columns::Column;

pub const LINE_WIDTH_MIN: f64 = 0.5;
pub const LINE_WIDTH_MAX: f64 = 10.0;
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

pub const MARKER_SIZE_MIN: f64 = 0.0;
pub const MARKER_SIZE_MAX: f64 = 20.0;
pub const DEFAULT_MARKER_SIZE: f64 = 6.0;

/// Line dash pattern. Serialized as the matplotlib token the backend expects.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    #[serde(rename = "-")]
    Solid,
    #[serde(rename = "--")]
    Dashed,
    #[serde(rename = ":")]
    Dotted,
    #[serde(rename = "-.")]
    DashDot,
}

impl LineStyle {
    pub const ALL: [Self; 4] = [Self::Solid, Self::Dashed, Self::Dotted, Self::DashDot];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "Solid",
            Self::Dashed => "Dashed",
            Self::Dotted => "Dotted",
            Self::DashDot => "Dash-dot",
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Solid => "-",
            Self::Dashed => "--",
            Self::Dotted => ":",
            Self::DashDot => "-.",
        }
    }

    /// Accepts a name (`solid`, `dash-dot`, ...) or a token (`--`).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|v| {
            v.token() == s || v.as_str().eq_ignore_ascii_case(s) || {
                let name = v.as_str().replace('-', "");
                name.eq_ignore_ascii_case(&s.replace(['-', '_'], ""))
            }
        })
    }
}

/// Marker drawn at each data point. Serialized as the matplotlib token.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerStyle {
    #[default]
    #[serde(rename = "o")]
    Circle,
    #[serde(rename = "s")]
    Square,
    #[serde(rename = "^")]
    Triangle,
    #[serde(rename = "*")]
    Star,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "x")]
    X,
    #[serde(rename = "none")]
    None,
}

impl MarkerStyle {
    pub const ALL: [Self; 7] = [
        Self::Circle,
        Self::Square,
        Self::Triangle,
        Self::Star,
        Self::Plus,
        Self::X,
        Self::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "Circle",
            Self::Square => "Square",
            Self::Triangle => "Triangle",
            Self::Star => "Star",
            Self::Plus => "Plus",
            Self::X => "X",
            Self::None => "None",
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Circle => "o",
            Self::Square => "s",
            Self::Triangle => "^",
            Self::Star => "*",
            Self::Plus => "+",
            Self::X => "x",
            Self::None => "none",
        }
    }

    /// Accepts a name (`circle`) or a token (`o`).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.token() == s || v.as_str().eq_ignore_ascii_case(s))
    }
}

/// Style of one Y-axis series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesConfig {
    pub column: Column,
    pub legend_label: String,
    pub line_style: LineStyle,
    pub line_width: f64,
    pub marker_style: MarkerStyle,
    pub marker_size: f64,
}

impl SeriesConfig {
    /// Defaults for a newly selected column; the legend label starts as the column name.
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            legend_label: column.to_string(),
            line_style: LineStyle::default(),
            line_width: DEFAULT_LINE_WIDTH,
            marker_style: MarkerStyle::default(),
            marker_size: DEFAULT_MARKER_SIZE,
        }
    }

    pub fn apply(&mut self, edit: SeriesEdit) {
        match edit {
            SeriesEdit::LegendLabel(label) => self.legend_label = label,
            SeriesEdit::LineStyle(style) => self.line_style = style,
            SeriesEdit::LineWidth(width) => self.line_width = width,
            SeriesEdit::MarkerStyle(marker) => self.marker_style = marker,
            SeriesEdit::MarkerSize(size) => self.marker_size = size,
        }
    }
}

/// A single-field change to one series. Values are stored as given and
/// clamped when the request is composed.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesEdit {
    LegendLabel(String),
    LineStyle(LineStyle),
    LineWidth(f64),
    MarkerStyle(MarkerStyle),
    MarkerSize(f64),
}

/// Series configs whose keys equal the current Y selection, in selection order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SeriesConfigSet {
    configs: Vec<SeriesConfig>,
}

impl SeriesConfigSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the set for a new selection. Configs of columns that stay
    /// selected are kept as they are (edited labels included), new columns
    /// get defaults, deselected columns are dropped. Output order is the
    /// selection order.
    pub fn reconcile(&self, selected: &[Column]) -> SeriesConfigSet {
        let configs = selected
            .iter()
            .map(|column| {
                self.get(column)
                    .cloned()
                    .unwrap_or_else(|| SeriesConfig::new(column))
            })
            .collect();
        SeriesConfigSet { configs }
    }

    pub fn get(&self, column: &str) -> Option<&SeriesConfig> {
        self.configs.iter().find(|c| c.column == column)
    }

    /// Edit one entry in place. Returns false when the column has no config.
    pub fn edit(&mut self, column: &str, edit: SeriesEdit) -> bool {
        match self.configs.iter_mut().find(|c| c.column == column) {
            Some(config) => {
                config.apply(edit);
                true
            }
            None => false,
        }
    }

    pub fn configs(&self) -> &[SeriesConfig] {
        &self.configs
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|c| c.column.as_str())
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
