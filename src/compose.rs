//! Request composition: validate the current form state and build the
//! payload for the rendering backend.
//!
//! Numeric fields are clamped here and only here. Everything downstream
//! (the HTTP client, the backend) receives already-normalized values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::chart_options::{
    ChartOptions, ColorScheme, GridStyle, LegendPosition, PlotKind, DEFAULT_FIGURE_HEIGHT,
    DEFAULT_FIGURE_WIDTH, FIGURE_SIZE_MAX, FIGURE_SIZE_MIN,
};
use crate::columns::{Column, ColumnRegistry};
use crate::error::CompositionError;
use crate::series::{
    SeriesConfig, SeriesConfigSet, DEFAULT_LINE_WIDTH, DEFAULT_MARKER_SIZE, LINE_WIDTH_MAX,
    LINE_WIDTH_MIN, MARKER_SIZE_MAX, MARKER_SIZE_MIN,
};

/// The file picked by the user. Contents are opaque to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Arc<Vec<u8>>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Read a file from disk; the name sent to the backend is the file name component.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Structured part of the render request, sent as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderParams {
    pub plot_kind: PlotKind,
    pub title: String,
    pub x_column: Column,
    pub y_columns: Vec<Column>,
    pub grid_style: GridStyle,
    pub color_scheme: ColorScheme,
    pub use_log_scale: bool,
    pub legend_position: LegendPosition,
    pub figure_width: f64,
    pub figure_height: f64,
    pub x_axis_label: Option<String>,
    pub y_axis_label: Option<String>,
    pub series_configs: Vec<SeriesConfig>,
}

impl RenderParams {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Everything the rendering backend needs: the raw file plus the parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationRequest {
    pub file: SelectedFile,
    pub params: RenderParams,
}

/// Parse a number typed as text. Blank or unparseable text yields None.
pub fn coerce_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Clamp to `[min, max]`; non-finite values become `default`.
pub fn clamp_or(value: f64, min: f64, max: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}

fn normalize_series(config: &SeriesConfig) -> SeriesConfig {
    SeriesConfig {
        line_width: clamp_or(
            config.line_width,
            LINE_WIDTH_MIN,
            LINE_WIDTH_MAX,
            DEFAULT_LINE_WIDTH,
        ),
        marker_size: clamp_or(
            config.marker_size,
            MARKER_SIZE_MIN,
            MARKER_SIZE_MAX,
            DEFAULT_MARKER_SIZE,
        ),
        ..config.clone()
    }
}

/// Build the render request from the current form state.
///
/// Checks run in order: file present, X column chosen, at least one Y
/// column when the plot kind draws series. File contents are never read.
pub fn compose(
    registry: &ColumnRegistry,
    selection: &[Column],
    series: &SeriesConfigSet,
    options: &ChartOptions,
    file: Option<&SelectedFile>,
) -> Result<VisualizationRequest, CompositionError> {
    let file = file.ok_or(CompositionError::NoFileSelected)?;

    let x_column = options
        .x_column
        .as_ref()
        .filter(|x| registry.contains(x))
        .ok_or(CompositionError::NoXColumn)?;

    if options.plot_kind.requires_series() && selection.is_empty() {
        return Err(CompositionError::EmptySeriesSelection);
    }

    let series_configs = selection
        .iter()
        .map(|column| {
            series
                .get(column)
                .map(normalize_series)
                .unwrap_or_else(|| SeriesConfig::new(column))
        })
        .collect();

    let params = RenderParams {
        plot_kind: options.plot_kind,
        title: options.title.trim().to_string(),
        x_column: x_column.clone(),
        y_columns: selection.to_vec(),
        grid_style: options.grid_style,
        color_scheme: options.color_scheme,
        use_log_scale: options.log_scale,
        legend_position: options.legend_position,
        figure_width: clamp_or(
            options.figure_width,
            FIGURE_SIZE_MIN,
            FIGURE_SIZE_MAX,
            DEFAULT_FIGURE_WIDTH,
        ),
        figure_height: clamp_or(
            options.figure_height,
            FIGURE_SIZE_MIN,
            FIGURE_SIZE_MAX,
            DEFAULT_FIGURE_HEIGHT,
        ),
        x_axis_label: options.x_axis_label.clone(),
        y_axis_label: options.y_axis_label.clone(),
        series_configs,
    };

    Ok(VisualizationRequest {
        file: file.clone(),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesEdit;

    fn setup(y: &[&str]) -> (ColumnRegistry, Vec<Column>, SeriesConfigSet, ChartOptions) {
        let mut registry = ColumnRegistry::new();
        registry
            .replace(vec!["date".into(), "temp".into(), "humidity".into()])
            .unwrap();
        let selection: Vec<Column> = y.iter().map(|s| s.to_string()).collect();
        let series = SeriesConfigSet::new().reconcile(&selection);
        let options = ChartOptions {
            x_column: Some("date".into()),
            ..ChartOptions::default()
        };
        (registry, selection, series, options)
    }

    fn file() -> SelectedFile {
        SelectedFile::new("weather.csv", b"date,temp,humidity\n".to_vec())
    }

    #[test]
    fn no_file_is_rejected_first() {
        let (reg, sel, series, opts) = setup(&[]);
        let err = compose(&reg, &sel, &series, &opts, None).unwrap_err();
        assert_eq!(err, CompositionError::NoFileSelected);
    }

    #[test]
    fn empty_selection_rejected_for_series_kinds() {
        let (reg, sel, series, opts) = setup(&[]);
        let f = file();
        let err = compose(&reg, &sel, &series, &opts, Some(&f)).unwrap_err();
        assert_eq!(err, CompositionError::EmptySeriesSelection);
    }

    #[test]
    fn histogram_needs_no_series() {
        let (reg, sel, series, mut opts) = setup(&[]);
        opts.plot_kind = PlotKind::Histogram;
        let f = file();
        let req = compose(&reg, &sel, &series, &opts, Some(&f)).unwrap();
        assert!(req.params.y_columns.is_empty());
        assert!(req.params.series_configs.is_empty());
    }

    #[test]
    fn x_column_must_be_known() {
        let (reg, sel, series, mut opts) = setup(&["temp"]);
        let f = file();
        opts.x_column = None;
        assert_eq!(
            compose(&reg, &sel, &series, &opts, Some(&f)).unwrap_err(),
            CompositionError::NoXColumn
        );
        opts.x_column = Some("pressure".into());
        assert_eq!(
            compose(&reg, &sel, &series, &opts, Some(&f)).unwrap_err(),
            CompositionError::NoXColumn
        );
    }

    #[test]
    fn numeric_fields_are_clamped() {
        let (reg, sel, mut series, mut opts) = setup(&["temp", "humidity"]);
        series.edit("temp", SeriesEdit::LineWidth(42.0));
        series.edit("temp", SeriesEdit::MarkerSize(-3.0));
        series.edit("humidity", SeriesEdit::LineWidth(f64::NAN));
        opts.figure_width = 0.0;
        opts.figure_height = 500.0;
        let f = file();
        let req = compose(&reg, &sel, &series, &opts, Some(&f)).unwrap();
        let p = &req.params;
        assert_eq!(p.series_configs[0].line_width, LINE_WIDTH_MAX);
        assert_eq!(p.series_configs[0].marker_size, MARKER_SIZE_MIN);
        assert_eq!(p.series_configs[1].line_width, DEFAULT_LINE_WIDTH);
        assert_eq!(p.figure_width, FIGURE_SIZE_MIN);
        assert_eq!(p.figure_height, FIGURE_SIZE_MAX);
        // The stored values stay as typed; only the request is normalized.
        assert_eq!(series.get("temp").unwrap().line_width, 42.0);
    }

    #[test]
    fn request_carries_selection_order_and_labels() {
        let (reg, _, series, opts) = setup(&["temp", "humidity"]);
        let mut series = series.reconcile(&["humidity".into(), "temp".into()]);
        series.edit("temp", SeriesEdit::LegendLabel("Temperature".into()));
        let sel: Vec<Column> = vec!["humidity".into(), "temp".into()];
        let f = file();
        let req = compose(&reg, &sel, &series, &opts, Some(&f)).unwrap();
        assert_eq!(req.params.y_columns, vec!["humidity", "temp"]);
        let labels: Vec<&str> = req
            .params
            .series_configs
            .iter()
            .map(|c| c.legend_label.as_str())
            .collect();
        assert_eq!(labels, vec!["humidity", "Temperature"]);
        assert_eq!(req.file.name, "weather.csv");
    }

    #[test]
    fn params_json_schema() {
        let (reg, sel, series, opts) = setup(&["temp"]);
        let f = file();
        let req = compose(&reg, &sel, &series, &opts, Some(&f)).unwrap();
        let v: serde_json::Value = serde_json::from_str(&req.params.to_json().unwrap()).unwrap();
        assert_eq!(v["plotKind"], "line");
        assert_eq!(v["xColumn"], "date");
        assert_eq!(v["yColumns"][0], "temp");
        assert_eq!(v["gridStyle"], "darkgrid");
        assert_eq!(v["useLogScale"], false);
        assert_eq!(v["legendPosition"], "best");
        assert_eq!(v["figureWidth"], 12.0);
        assert_eq!(v["seriesConfigs"][0]["lineStyle"], "-");
        assert!(v["xAxisLabel"].is_null());
    }

    #[test]
    fn coerce_number_handles_text() {
        assert_eq!(coerce_number(" 2.5 "), Some(2.5));
        assert_eq!(coerce_number("abc"), None);
        assert_eq!(coerce_number(""), None);
        assert_eq!(coerce_number("inf"), None);
    }
}
