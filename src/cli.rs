//! Command-line arguments and how they override the configuration.

use color_eyre::eyre::eyre;
use color_eyre::Result;

pub use seacanvas_cli::{
    Args, ColorSchemeArg, ExportFormatArg, GridStyleArg, LegendPositionArg, PlotKindArg,
};

use crate::chart_options::{
    ChartOptions, ColorScheme, GridStyle, LegendPosition, PlotKind, DEFAULT_FIGURE_HEIGHT,
    DEFAULT_FIGURE_WIDTH, FIGURE_SIZE_MAX, FIGURE_SIZE_MIN,
};
use crate::columns::Column;
use crate::compose::{clamp_or, coerce_number};
use crate::config::AppConfig;
use crate::plot_view::ExportFormat;
use crate::series::{
    LineStyle, MarkerStyle, SeriesEdit, DEFAULT_LINE_WIDTH, DEFAULT_MARKER_SIZE,
};
use tracing::warn;

impl From<PlotKindArg> for PlotKind {
    fn from(arg: PlotKindArg) -> Self {
        match arg {
            PlotKindArg::Line => PlotKind::Line,
            PlotKindArg::Scatter => PlotKind::Scatter,
            PlotKindArg::Bar => PlotKind::Bar,
            PlotKindArg::Histogram => PlotKind::Histogram,
        }
    }
}

impl From<GridStyleArg> for GridStyle {
    fn from(arg: GridStyleArg) -> Self {
        match arg {
            GridStyleArg::Darkgrid => GridStyle::Darkgrid,
            GridStyleArg::Whitegrid => GridStyle::Whitegrid,
            GridStyleArg::Dark => GridStyle::Dark,
            GridStyleArg::White => GridStyle::White,
            GridStyleArg::Ticks => GridStyle::Ticks,
        }
    }
}

impl From<ColorSchemeArg> for ColorScheme {
    fn from(arg: ColorSchemeArg) -> Self {
        match arg {
            ColorSchemeArg::Deep => ColorScheme::Deep,
            ColorSchemeArg::Muted => ColorScheme::Muted,
            ColorSchemeArg::Pastel => ColorScheme::Pastel,
            ColorSchemeArg::Bright => ColorScheme::Bright,
            ColorSchemeArg::Dark => ColorScheme::Dark,
            ColorSchemeArg::Colorblind => ColorScheme::Colorblind,
        }
    }
}

impl From<LegendPositionArg> for LegendPosition {
    fn from(arg: LegendPositionArg) -> Self {
        match arg {
            LegendPositionArg::Best => LegendPosition::Best,
            LegendPositionArg::UpperRight => LegendPosition::UpperRight,
            LegendPositionArg::UpperLeft => LegendPosition::UpperLeft,
            LegendPositionArg::LowerLeft => LegendPosition::LowerLeft,
            LegendPositionArg::LowerRight => LegendPosition::LowerRight,
            LegendPositionArg::Right => LegendPosition::Right,
            LegendPositionArg::CenterLeft => LegendPosition::CenterLeft,
            LegendPositionArg::CenterRight => LegendPosition::CenterRight,
            LegendPositionArg::LowerCenter => LegendPosition::LowerCenter,
            LegendPositionArg::UpperCenter => LegendPosition::UpperCenter,
            LegendPositionArg::Center => LegendPosition::Center,
            LegendPositionArg::None => LegendPosition::Hidden,
        }
    }
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Png => ExportFormat::Png,
            ExportFormatArg::Pdf => ExportFormat::Pdf,
            ExportFormatArg::Svg => ExportFormat::Svg,
        }
    }
}

/// Apply CLI overrides on top of the loaded configuration.
pub fn apply_args_to_config(args: &Args, config: &mut AppConfig) {
    if let Some(url) = &args.backend_url {
        config.backend.base_url = url.clone();
    }
    if let Some(kind) = args.kind {
        config.chart.plot_kind = kind.into();
    }
    if let Some(style) = args.grid_style {
        config.chart.grid_style = style.into();
    }
    if let Some(scheme) = args.color_scheme {
        config.chart.color_scheme = scheme.into();
    }
    if let Some(legend) = args.legend {
        config.chart.legend_position = legend.into();
    }
    if args.log_scale {
        config.chart.log_scale = true;
    }
    // Out-of-range sizes are clamped like every other numeric form field.
    if let Some(width) = args.width {
        config.chart.figure_width =
            clamp_or(width, FIGURE_SIZE_MIN, FIGURE_SIZE_MAX, DEFAULT_FIGURE_WIDTH);
    }
    if let Some(height) = args.height {
        config.chart.figure_height =
            clamp_or(height, FIGURE_SIZE_MIN, FIGURE_SIZE_MAX, DEFAULT_FIGURE_HEIGHT);
    }
    if let Some(Some(format)) = args.export {
        config.export.format = format.into();
    }
    if args.debug {
        config.debug.log_level = "debug".to_string();
    }
}

/// Format to export in, if an export was asked for. A bare `--export`
/// uses the configured format.
pub fn export_format(args: &Args, config: &AppConfig) -> Option<ExportFormat> {
    args.export
        .map(|format| format.map(ExportFormat::from).unwrap_or(config.export.format))
}

/// Chart options a session starts with: config defaults plus the
/// per-run text fields only the CLI supplies.
pub fn chart_options_from_args_and_config(args: &Args, config: &AppConfig) -> ChartOptions {
    let mut options = config.chart.chart_options();
    options.title = args.title.clone().unwrap_or_default();
    options.x_axis_label = args.x_label.clone().filter(|s| !s.trim().is_empty());
    options.y_axis_label = args.y_label.clone().filter(|s| !s.trim().is_empty());
    options
}

/// Style edits for one series, parsed from `--series`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub column: Column,
    pub edits: Vec<SeriesEdit>,
}

fn number_or_default(value: &str, key: &str, default: f64) -> f64 {
    coerce_number(value).unwrap_or_else(|| {
        warn!(key, value, default, "not a number, using the default");
        default
    })
}

/// Parse `COL:key=value,key=value`. Keys: `label`, `style`, `width`,
/// `marker`, `size`. The column is split at the last `:` so column names
/// may themselves contain colons. Unparseable numbers fall back to the
/// field default.
pub fn parse_series_spec(spec: &str) -> Result<SeriesSpec> {
    let (column, settings) = spec
        .rsplit_once(':')
        .ok_or_else(|| eyre!("Invalid --series '{}': expected COL:key=value,...", spec))?;
    if column.is_empty() {
        return Err(eyre!("Invalid --series '{}': missing column name", spec));
    }

    let mut edits = Vec::new();
    for setting in settings.split(',').filter(|s| !s.trim().is_empty()) {
        let (key, value) = setting
            .split_once('=')
            .ok_or_else(|| eyre!("Invalid --series setting '{}': expected key=value", setting))?;
        let edit = match key.trim() {
            "label" => SeriesEdit::LegendLabel(value.to_string()),
            "style" => SeriesEdit::LineStyle(
                LineStyle::parse(value).ok_or_else(|| eyre!("Unknown line style '{}'", value))?,
            ),
            "marker" => SeriesEdit::MarkerStyle(
                MarkerStyle::parse(value).ok_or_else(|| eyre!("Unknown marker '{}'", value))?,
            ),
            "width" => SeriesEdit::LineWidth(number_or_default(value, "width", DEFAULT_LINE_WIDTH)),
            "size" => SeriesEdit::MarkerSize(number_or_default(value, "size", DEFAULT_MARKER_SIZE)),
            other => return Err(eyre!("Unknown --series key '{}'", other)),
        };
        edits.push(edit);
    }

    Ok(SeriesSpec {
        column: column.to_string(),
        edits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn series_spec_parses_all_keys() {
        let spec =
            parse_series_spec("temp:label=Temperature,style=dashed,width=3,marker=^,size=8")
                .unwrap();
        assert_eq!(spec.column, "temp");
        assert_eq!(
            spec.edits,
            vec![
                SeriesEdit::LegendLabel("Temperature".into()),
                SeriesEdit::LineStyle(LineStyle::Dashed),
                SeriesEdit::LineWidth(3.0),
                SeriesEdit::MarkerStyle(MarkerStyle::Triangle),
                SeriesEdit::MarkerSize(8.0),
            ]
        );
    }

    #[test]
    fn series_spec_column_may_contain_colon() {
        let spec = parse_series_spec("time:utc:style=--").unwrap();
        assert_eq!(spec.column, "time:utc");
        assert_eq!(spec.edits, vec![SeriesEdit::LineStyle(LineStyle::Dashed)]);
    }

    #[test]
    fn series_spec_rejects_garbage() {
        assert!(parse_series_spec("temp").is_err());
        assert!(parse_series_spec(":style=-").is_err());
        assert!(parse_series_spec("temp:color=red").is_err());
        assert!(parse_series_spec("temp:marker=hexagon").is_err());
    }

    #[test]
    fn series_spec_bad_number_uses_default() {
        let spec = parse_series_spec("temp:width=wide,size=").unwrap();
        assert_eq!(
            spec.edits,
            vec![
                SeriesEdit::LineWidth(DEFAULT_LINE_WIDTH),
                SeriesEdit::MarkerSize(DEFAULT_MARKER_SIZE),
            ]
        );
    }

    #[test]
    fn args_override_config() {
        let args = Args::parse_from([
            "seacanvas",
            "data.csv",
            "--kind",
            "scatter",
            "--legend",
            "none",
            "--width",
            "6",
            "--backend-url",
            "http://plots:9000",
            "--title",
            "Weather",
            "--x-label",
            " ",
        ]);
        let mut config = AppConfig::default();
        apply_args_to_config(&args, &mut config);
        assert_eq!(config.backend.base_url, "http://plots:9000");
        assert_eq!(config.chart.plot_kind, PlotKind::Scatter);
        assert_eq!(config.chart.legend_position, LegendPosition::Hidden);
        assert_eq!(config.chart.figure_width, 6.0);
        assert_eq!(config.chart.figure_height, 8.0);

        let options = chart_options_from_args_and_config(&args, &config);
        assert_eq!(options.title, "Weather");
        assert_eq!(options.plot_kind, PlotKind::Scatter);
        assert!(options.x_axis_label.is_none());
    }

    #[test]
    fn oversized_figure_is_clamped_not_rejected() {
        use crate::columns::ColumnRegistry;
        use crate::compose::{compose, SelectedFile};
        use crate::series::SeriesConfigSet;

        let args = Args::parse_from(["seacanvas", "data.csv", "--width", "100", "--height", "0"]);
        let mut config = AppConfig::default();
        apply_args_to_config(&args, &mut config);
        config.validate().unwrap();

        let mut registry = ColumnRegistry::new();
        registry.replace(vec!["date".into(), "temp".into()]).unwrap();
        let selection = vec!["temp".to_string()];
        let series = SeriesConfigSet::new().reconcile(&selection);
        let mut options = chart_options_from_args_and_config(&args, &config);
        options.x_column = Some("date".into());
        let file = SelectedFile::new("data.csv", b"date,temp\n".to_vec());
        let request = compose(&registry, &selection, &series, &options, Some(&file)).unwrap();
        let params: serde_json::Value =
            serde_json::from_str(&request.params.to_json().unwrap()).unwrap();
        assert_eq!(params["figureWidth"], 50.0);
        assert_eq!(params["figureHeight"], 1.0);
    }

    #[test]
    fn bare_export_uses_configured_format() {
        let mut config = AppConfig::default();
        config.export.format = ExportFormat::Pdf;

        let args = Args::parse_from(["seacanvas", "--export", "data.csv"]);
        apply_args_to_config(&args, &mut config);
        assert_eq!(export_format(&args, &config), Some(ExportFormat::Pdf));

        let args = Args::parse_from(["seacanvas", "data.csv", "--export=svg"]);
        apply_args_to_config(&args, &mut config);
        assert_eq!(export_format(&args, &config), Some(ExportFormat::Svg));

        let args = Args::parse_from(["seacanvas", "data.csv"]);
        assert_eq!(export_format(&args, &config), None);
    }
}
