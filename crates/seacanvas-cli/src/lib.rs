//! Shared CLI definitions for seacanvas.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Plot kind requested from the rendering backend.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PlotKindArg {
    /// One line per Y column
    Line,
    /// One point cloud per Y column
    Scatter,
    /// Bars for the first Y column
    Bar,
    /// Distribution of the X column (no Y columns needed)
    Histogram,
}

/// Background/grid style of the rendered figure.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum GridStyleArg {
    Darkgrid,
    Whitegrid,
    Dark,
    White,
    Ticks,
}

/// Color palette used for the series.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ColorSchemeArg {
    Deep,
    Muted,
    Pastel,
    Bright,
    Dark,
    Colorblind,
}

/// Legend placement. `none` hides the legend.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LegendPositionArg {
    Best,
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
    Right,
    CenterLeft,
    CenterRight,
    LowerCenter,
    UpperCenter,
    Center,
    None,
}

/// File format produced by the download endpoint.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExportFormatArg {
    Png,
    Pdf,
    Svg,
}

/// Command-line arguments for seacanvas
#[derive(Clone, Parser, Debug)]
#[command(
    name = "seacanvas",
    version,
    about = "Request rendered charts of tabular data from a plotting backend",
    long_about = "Upload a CSV or Excel file to a plotting backend, pick the X and Y columns, \
                  style each series and fetch the rendered chart. The chart can be written \
                  as PNG directly or exported through the backend as PNG, PDF or SVG."
)]
pub struct Args {
    /// Path to the data file to upload (not required with --generate-config)
    #[arg(required_unless_present = "generate_config", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Print the columns reported by the backend and exit
    #[arg(long = "list-columns", action)]
    pub list_columns: bool,

    /// X-axis column (default: first column of the file)
    #[arg(short = 'x', long = "x-column", value_name = "COL")]
    pub x_column: Option<String>,

    /// Y-axis column; repeat for several series (order = series order)
    #[arg(short = 'y', long = "y-column", value_name = "COL")]
    pub y_columns: Vec<String>,

    /// Per-series style, e.g. `temp:label=Temperature,style=dashed,width=3,marker=square,size=8`.
    /// Repeatable; the column must also be given with -y.
    #[arg(long = "series", value_name = "SPEC")]
    pub series: Vec<String>,

    /// Plot kind (overrides config [chart] plot_kind)
    #[arg(long = "kind", value_enum)]
    pub kind: Option<PlotKindArg>,

    /// Chart title
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Grid style (overrides config [chart] grid_style)
    #[arg(long = "grid-style", value_enum)]
    pub grid_style: Option<GridStyleArg>,

    /// Color scheme (overrides config [chart] color_scheme)
    #[arg(long = "color-scheme", value_enum)]
    pub color_scheme: Option<ColorSchemeArg>,

    /// Use a logarithmic Y axis
    #[arg(long = "log-scale", action)]
    pub log_scale: bool,

    /// Legend position (overrides config [chart] legend_position)
    #[arg(long = "legend", value_enum)]
    pub legend: Option<LegendPositionArg>,

    /// Figure width in inches (default: 12)
    #[arg(long = "width", value_name = "INCHES")]
    pub width: Option<f64>,

    /// Figure height in inches (default: 8)
    #[arg(long = "height", value_name = "INCHES")]
    pub height: Option<f64>,

    /// X-axis label (default: the X column name)
    #[arg(long = "x-label")]
    pub x_label: Option<String>,

    /// Y-axis label (default: the Y column names)
    #[arg(long = "y-label")]
    pub y_label: Option<String>,

    /// Write the rendered PNG to this path
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export the rendered chart through the backend. `--export` alone uses the
    /// config [export] format; `--export=pdf` picks one explicitly
    #[arg(long = "export", value_enum, value_name = "FORMAT", require_equals = true)]
    pub export: Option<Option<ExportFormatArg>>,

    /// Base file name for --export (default: timestamp-derived)
    #[arg(long = "filename", requires = "export")]
    pub filename: Option<String>,

    /// Backend base URL (overrides config [backend] base_url). Example: http://127.0.0.1:8000
    #[arg(long = "backend-url", value_name = "URL")]
    pub backend_url: Option<String>,

    /// Enable debug logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/seacanvas/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
///
/// Used by the gen_docs binary; output is written to stdout.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_repeated_y_columns() {
        let args = Args::try_parse_from([
            "seacanvas", "data.csv", "-x", "date", "-y", "temp", "-y", "humidity",
        ])
        .unwrap();
        assert_eq!(args.path, Some(PathBuf::from("data.csv")));
        assert_eq!(args.x_column.as_deref(), Some("date"));
        assert_eq!(args.y_columns, vec!["temp", "humidity"]);
    }

    #[test]
    fn test_path_optional_with_generate_config() {
        let args = Args::try_parse_from(["seacanvas", "--generate-config"]).unwrap();
        assert!(args.path.is_none());
        assert!(Args::try_parse_from(["seacanvas"]).is_err());
    }

    #[test]
    fn test_filename_requires_export() {
        assert!(Args::try_parse_from(["seacanvas", "a.csv", "--filename", "out"]).is_err());
        let args =
            Args::try_parse_from(["seacanvas", "a.csv", "--export=pdf", "--filename", "out"])
                .unwrap();
        assert_eq!(args.export, Some(Some(ExportFormatArg::Pdf)));
    }

    #[test]
    fn test_export_format_is_optional() {
        let args = Args::try_parse_from(["seacanvas", "--export", "a.csv"]).unwrap();
        assert_eq!(args.export, Some(None));
        assert_eq!(args.path, Some(PathBuf::from("a.csv")));
        let args = Args::try_parse_from(["seacanvas", "a.csv"]).unwrap();
        assert_eq!(args.export, None);
    }

    #[test]
    fn test_legend_value_names_are_kebab_case() {
        let args = Args::try_parse_from(["seacanvas", "a.csv", "--legend", "upper-left"]).unwrap();
        assert_eq!(args.legend, Some(LegendPositionArg::UpperLeft));
    }

    #[test]
    fn test_render_options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("--y-column"));
        assert!(md.contains("--generate-config"));
        assert!(!md.contains("`--help`"));
    }
}
