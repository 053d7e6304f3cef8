//! Chart-level options: plot kind, axis columns, styling and figure size.

use serde::{Deserialize, Serialize};

use crate::columns::Column;

/// Default figure size in inches.
pub const DEFAULT_FIGURE_WIDTH: f64 = 12.0;
pub const DEFAULT_FIGURE_HEIGHT: f64 = 8.0;
pub const FIGURE_SIZE_MIN: f64 = 1.0;
pub const FIGURE_SIZE_MAX: f64 = 50.0;

/// Plot kind sent to the renderer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    #[default]
    Line,
    Scatter,
    Bar,
    /// Distribution of the X column; has no per-series notion.
    Histogram,
}

impl PlotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Scatter => "Scatter",
            Self::Bar => "Bar",
            Self::Histogram => "Histogram",
        }
    }

    /// Whether at least one Y column must be selected before submitting.
    pub fn requires_series(self) -> bool {
        !matches!(self, Self::Histogram)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStyle {
    #[default]
    Darkgrid,
    Whitegrid,
    Dark,
    White,
    Ticks,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Deep,
    Muted,
    Pastel,
    Bright,
    Dark,
    Colorblind,
}

/// Legend location, serialized as the renderer's location string.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendPosition {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "upper right")]
    UpperRight,
    #[serde(rename = "upper left")]
    UpperLeft,
    #[serde(rename = "lower left")]
    LowerLeft,
    #[serde(rename = "lower right")]
    LowerRight,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "center left")]
    CenterLeft,
    #[serde(rename = "center right")]
    CenterRight,
    #[serde(rename = "lower center")]
    LowerCenter,
    #[serde(rename = "upper center")]
    UpperCenter,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "none")]
    Hidden,
}

/// Options that apply to the whole chart rather than one series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub plot_kind: PlotKind,
    pub title: String,
    /// Selected X column. Reset to the first column after each upload.
    pub x_column: Option<Column>,
    pub grid_style: GridStyle,
    pub color_scheme: ColorScheme,
    pub log_scale: bool,
    pub legend_position: LegendPosition,
    pub figure_width: f64,
    pub figure_height: f64,
    /// None = let the renderer use the column names.
    pub x_axis_label: Option<String>,
    pub y_axis_label: Option<String>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            plot_kind: PlotKind::default(),
            title: String::new(),
            x_column: None,
            grid_style: GridStyle::default(),
            color_scheme: ColorScheme::default(),
            log_scale: false,
            legend_position: LegendPosition::default(),
            figure_width: DEFAULT_FIGURE_WIDTH,
            figure_height: DEFAULT_FIGURE_HEIGHT,
            x_axis_label: None,
            y_axis_label: None,
        }
    }
}

/// A single chart-level change.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOptionEdit {
    PlotKind(PlotKind),
    Title(String),
    GridStyle(GridStyle),
    ColorScheme(ColorScheme),
    LogScale(bool),
    LegendPosition(LegendPosition),
    FigureWidth(f64),
    FigureHeight(f64),
    XAxisLabel(Option<String>),
    YAxisLabel(Option<String>),
}

impl ChartOptions {
    pub fn apply(&mut self, edit: ChartOptionEdit) {
        match edit {
            ChartOptionEdit::PlotKind(kind) => self.plot_kind = kind,
            ChartOptionEdit::Title(title) => self.title = title,
            ChartOptionEdit::GridStyle(style) => self.grid_style = style,
            ChartOptionEdit::ColorScheme(scheme) => self.color_scheme = scheme,
            ChartOptionEdit::LogScale(on) => self.log_scale = on,
            ChartOptionEdit::LegendPosition(pos) => self.legend_position = pos,
            ChartOptionEdit::FigureWidth(w) => self.figure_width = w,
            ChartOptionEdit::FigureHeight(h) => self.figure_height = h,
            ChartOptionEdit::XAxisLabel(label) => self.x_axis_label = non_blank(label),
            ChartOptionEdit::YAxisLabel(label) => self.y_axis_label = non_blank(label),
        }
    }
}

fn non_blank(label: Option<String>) -> Option<String> {
    label.filter(|s| !s.trim().is_empty())
}
