//! seacanvas: compose chart requests for a plotting backend.
//!
//! A [`Session`] keeps the uploaded file's columns, the Y-axis selection,
//! per-series styles and chart options consistent with each other, and runs
//! the upload → configure → render → export exchange with a [`Backend`].

pub mod backend;
pub mod chart_options;
pub mod cli;
pub mod columns;
pub mod compose;
pub mod config;
pub mod error;
pub mod logging;
pub mod plot_view;
pub mod series;
pub mod session;

pub use backend::Backend;
#[cfg(feature = "http")]
pub use backend::HttpBackend;
pub use chart_options::{
    ChartOptionEdit, ChartOptions, ColorScheme, GridStyle, LegendPosition, PlotKind,
};
pub use cli::Args;
pub use columns::{Column, ColumnRegistry};
pub use compose::{compose, RenderParams, SelectedFile, VisualizationRequest};
pub use config::{
    AppConfig, BackendConfig, ChartConfig, ConfigManager, DebugConfig, ExportConfig,
};
pub use error::{
    user_message_from_io, user_message_from_report, BackendError, CompositionError, ExportError,
    SessionError,
};
pub use plot_view::{ExportFormat, ExportRequest, ExportedFile, PlotView};
pub use series::{LineStyle, MarkerStyle, SeriesConfig, SeriesConfigSet, SeriesEdit};
pub use session::{LifecycleState, Session, SessionEvent, Transition};

/// Application name used for the config directory.
pub const APP_NAME: &str = "seacanvas";
