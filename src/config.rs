use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::chart_options::{
    ChartOptions, ColorScheme, GridStyle, LegendPosition, PlotKind, DEFAULT_FIGURE_HEIGHT,
    DEFAULT_FIGURE_WIDTH, FIGURE_SIZE_MAX, FIGURE_SIZE_MIN,
};
use crate::logging::LOG_LEVELS;
use crate::plot_view::ExportFormat;

const CONFIG_FILE: &str = "config.toml";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string with comments.
    /// All fields are commented out so defaults are used, but users can uncomment to override.
    pub fn generate_default_config(&self) -> Result<String> {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;

        let comments = Self::collect_all_comments();
        Ok(Self::comment_all_fields(toml_str, comments))
    }

    /// Collect all field comments from struct constants into a map
    fn collect_all_comments() -> HashMap<String, String> {
        let mut comments = HashMap::new();

        for (field, comment) in APP_COMMENTS {
            comments.insert(field.to_string(), comment.to_string());
        }
        for (field, comment) in BACKEND_COMMENTS {
            comments.insert(format!("backend.{}", field), comment.to_string());
        }
        for (field, comment) in CHART_COMMENTS {
            comments.insert(format!("chart.{}", field), comment.to_string());
        }
        for (field, comment) in EXPORT_COMMENTS {
            comments.insert(format!("export.{}", field), comment.to_string());
        }
        for (field, comment) in DEBUG_COMMENTS {
            comments.insert(format!("debug.{}", field), comment.to_string());
        }

        comments
    }

    /// Comment out all fields in TOML and add comments.
    /// Also adds missing Option fields as commented-out `# field = null`
    fn comment_all_fields(toml: String, comments: HashMap<String, String>) -> String {
        let mut result = String::new();
        result.push_str("# seacanvas configuration file\n");
        result
            .push_str("# This file uses TOML format. See https://toml.io/ for syntax reference.\n");
        result.push('\n');

        let mut current_section = String::new();
        let mut seen_fields: HashSet<String> = HashSet::new();

        for line in toml.lines() {
            if let Some(section) = Self::extract_section_name(line) {
                current_section = section.clone();

                if let Some(header) = SECTION_HEADERS.iter().find(|(s, _)| *s == section) {
                    result.push_str(header.1);
                    result.push('\n');
                }

                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
                continue;
            }

            if let Some(field_path) = Self::extract_field_path(line, &current_section) {
                if let Some(comment) = comments.get(&field_path) {
                    for comment_line in comment.lines() {
                        result.push_str("# ");
                        result.push_str(comment_line);
                        result.push('\n');
                    }
                }
                seen_fields.insert(field_path);

                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
            } else {
                result.push_str(line);
                result.push('\n');
            }
        }

        Self::add_missing_option_fields(result, &comments, &seen_fields)
    }

    /// Add Option fields that weren't serialized (because they're None)
    fn add_missing_option_fields(
        mut result: String,
        comments: &HashMap<String, String>,
        seen_fields: &HashSet<String>,
    ) -> String {
        let option_fields = ["export.output_dir"];

        for field_path in option_fields {
            if seen_fields.contains(field_path) {
                continue;
            }
            let Some((section, field_name)) = field_path.split_once('.') else {
                continue;
            };
            let section_header = format!("[{}]", section);
            let Some(section_pos) = result.find(&section_header) else {
                continue;
            };
            let after_header_start = section_pos + section_header.len();
            let newline_pos = result[after_header_start..].find('\n').unwrap_or(0);
            let insert_pos = after_header_start + newline_pos + 1;

            let mut new_content = String::new();
            if let Some(comment) = comments.get(field_path) {
                for comment_line in comment.lines() {
                    new_content.push_str("# ");
                    new_content.push_str(comment_line);
                    new_content.push('\n');
                }
            }
            new_content.push_str(&format!("# {} = null\n", field_name));
            result.insert_str(insert_pos, &new_content);
        }

        result
    }

    /// Extract section name from TOML line like "[backend]"
    fn extract_section_name(line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            Some(trimmed[1..trimmed.len() - 1].to_string())
        } else {
            None
        }
    }

    /// Extract field path (e.g. "backend.base_url") from an assignment line
    fn extract_field_path(line: &str, current_section: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('[') {
            return None;
        }

        let (field_name, _) = trimmed.split_once('=')?;
        let field_name = field_name.trim();
        if current_section.is_empty() {
            Some(field_name.to_string())
        } else {
            Some(format!("{}.{}", current_section, field_name))
        }
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path(CONFIG_FILE);

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;

        let template = self.generate_default_config()?;
        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub backend: BackendConfig,
    pub chart: ChartConfig,
    pub export: ExportConfig,
    pub debug: DebugConfig,
}

const APP_COMMENTS: &[(&str, &str)] = &[(
    "version",
    "Configuration format version (for future compatibility)",
)];

const SECTION_HEADERS: &[(&str, &str)] = &[
    (
        "backend",
        "# ============================================================================\n# Plotting Backend\n# ============================================================================\n# Where the column-extraction, rendering and download endpoints live.",
    ),
    (
        "chart",
        "# ============================================================================\n# Chart Defaults\n# ============================================================================",
    ),
    (
        "export",
        "# ============================================================================\n# Export\n# ============================================================================",
    ),
    (
        "debug",
        "# ============================================================================\n# Debug Settings\n# ============================================================================",
    ),
];

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Column-extraction endpoint (multipart file upload)
    pub columns_path: String,
    /// Rendering endpoint (multipart file + JSON parameters)
    pub render_path: String,
    /// Download/export endpoint (JSON body)
    pub download_path: String,
    /// Multipart part name carrying the data file
    pub file_field: String,
    /// Multipart part name carrying the JSON render parameters
    pub params_field: String,
    pub timeout_secs: u64,
}

const BACKEND_COMMENTS: &[(&str, &str)] = &[
    (
        "base_url",
        "Base URL of the plotting backend. Example: \"http://127.0.0.1:8000\"",
    ),
    (
        "columns_path",
        "Endpoint that receives the uploaded file and answers {\"columns\": [...]}",
    ),
    (
        "render_path",
        "Endpoint that renders the chart and answers {\"plot\": \"<base64 png>\"}",
    ),
    (
        "download_path",
        "Endpoint that converts the image to the export format and returns the file",
    ),
    ("file_field", "Multipart field name for the data file"),
    (
        "params_field",
        "Multipart field name for the JSON rendering parameters",
    ),
    ("timeout_secs", "Request timeout in seconds (> 0)"),
];

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            columns_path: "/upload".to_string(),
            render_path: "/visualize".to_string(),
            download_path: "/download".to_string(),
            file_field: "file".to_string(),
            params_field: "params".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub plot_kind: PlotKind,
    pub grid_style: GridStyle,
    pub color_scheme: ColorScheme,
    pub legend_position: LegendPosition,
    pub log_scale: bool,
    pub figure_width: f64,
    pub figure_height: f64,
}

const CHART_COMMENTS: &[(&str, &str)] = &[
    ("plot_kind", "Plot kind: line, scatter, bar or histogram"),
    (
        "grid_style",
        "Grid style: darkgrid, whitegrid, dark, white or ticks",
    ),
    (
        "color_scheme",
        "Color palette: deep, muted, pastel, bright, dark or colorblind",
    ),
    (
        "legend_position",
        "Legend location, e.g. \"best\", \"upper right\", \"lower left\", or \"none\" to hide it",
    ),
    ("log_scale", "Use a logarithmic Y axis by default"),
    (
        "figure_width",
        "Figure width in inches (1 to 50). Default 12",
    ),
    (
        "figure_height",
        "Figure height in inches (1 to 50). Default 8",
    ),
];

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            plot_kind: PlotKind::default(),
            grid_style: GridStyle::default(),
            color_scheme: ColorScheme::default(),
            legend_position: LegendPosition::default(),
            log_scale: false,
            figure_width: DEFAULT_FIGURE_WIDTH,
            figure_height: DEFAULT_FIGURE_HEIGHT,
        }
    }
}

impl ChartConfig {
    /// Chart options a new session starts with.
    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            plot_kind: self.plot_kind,
            grid_style: self.grid_style,
            color_scheme: self.color_scheme,
            legend_position: self.legend_position,
            log_scale: self.log_scale,
            figure_width: self.figure_width,
            figure_height: self.figure_height,
            ..ChartOptions::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Directory exported files are written to. None = current directory.
    pub output_dir: Option<String>,
}

const EXPORT_COMMENTS: &[(&str, &str)] = &[
    ("format", "Default export format: png, pdf or svg"),
    (
        "output_dir",
        "Directory for exported files. null = current directory",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level when RUST_LOG is not set
    pub log_level: String,
}

const DEBUG_COMMENTS: &[(&str, &str)] = &[(
    "log_level",
    "Log level when RUST_LOG is not set: off, error, warn, info, debug or trace",
)];

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            backend: BackendConfig::default(),
            chart: ChartConfig::default(),
            export: ExportConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_with(&manager)
    }

    /// Load configuration using the given config directory
    pub fn load_with(manager: &ConfigManager) -> Result<Self> {
        let config_path = manager.config_path(CONFIG_FILE);
        let mut config = AppConfig::default();
        config.merge(Self::load_user_config(&config_path)?);

        config.validate().map_err(|e| {
            eyre!(
                "Invalid configuration in {}: {}",
                config_path.display(),
                e
            )
        })?;

        Ok(config)
    }

    fn load_user_config(config_path: &Path) -> Result<AppConfig> {
        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.backend.merge(other.backend);
        self.chart.merge(other.chart);
        self.export.merge(other.export);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        let backend = &self.backend;
        if !(backend.base_url.starts_with("http://") || backend.base_url.starts_with("https://"))
        {
            return Err(eyre!(
                "backend.base_url must start with http:// or https://, got {}",
                backend.base_url
            ));
        }
        for (name, path) in [
            ("columns_path", &backend.columns_path),
            ("render_path", &backend.render_path),
            ("download_path", &backend.download_path),
        ] {
            if !path.starts_with('/') {
                return Err(eyre!("backend.{} must start with '/', got {}", name, path));
            }
        }
        if backend.file_field.trim().is_empty() || backend.params_field.trim().is_empty() {
            return Err(eyre!("backend.file_field and backend.params_field must not be empty"));
        }
        if backend.timeout_secs == 0 {
            return Err(eyre!("backend.timeout_secs must be greater than 0"));
        }

        for (name, value) in [
            ("figure_width", self.chart.figure_width),
            ("figure_height", self.chart.figure_height),
        ] {
            if !(FIGURE_SIZE_MIN..=FIGURE_SIZE_MAX).contains(&value) {
                return Err(eyre!(
                    "chart.{} must be between {} and {}, got {}",
                    name,
                    FIGURE_SIZE_MIN,
                    FIGURE_SIZE_MAX,
                    value
                ));
            }
        }

        if !LOG_LEVELS.contains(&self.debug.log_level.to_lowercase().as_str()) {
            return Err(eyre!(
                "debug.log_level must be one of {}, got {}",
                LOG_LEVELS.join(", "),
                self.debug.log_level
            ));
        }

        Ok(())
    }
}

// Merge implementations for each config section
impl BackendConfig {
    pub fn merge(&mut self, other: Self) {
        let default = BackendConfig::default();
        if other.base_url != default.base_url {
            self.base_url = other.base_url;
        }
        if other.columns_path != default.columns_path {
            self.columns_path = other.columns_path;
        }
        if other.render_path != default.render_path {
            self.render_path = other.render_path;
        }
        if other.download_path != default.download_path {
            self.download_path = other.download_path;
        }
        if other.file_field != default.file_field {
            self.file_field = other.file_field;
        }
        if other.params_field != default.params_field {
            self.params_field = other.params_field;
        }
        if other.timeout_secs != default.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.plot_kind != default.plot_kind {
            self.plot_kind = other.plot_kind;
        }
        if other.grid_style != default.grid_style {
            self.grid_style = other.grid_style;
        }
        if other.color_scheme != default.color_scheme {
            self.color_scheme = other.color_scheme;
        }
        if other.legend_position != default.legend_position {
            self.legend_position = other.legend_position;
        }
        if other.log_scale != default.log_scale {
            self.log_scale = other.log_scale;
        }
        if other.figure_width != default.figure_width {
            self.figure_width = other.figure_width;
        }
        if other.figure_height != default.figure_height {
            self.figure_height = other.figure_height;
        }
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        if other.format != ExportFormat::default() {
            self.format = other.format;
        }
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.log_level != DebugConfig::default().log_level {
            self.log_level = other.log_level;
        }
    }
}
