//! The displayed chart image and its export round-trip.

use base64::Engine;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{BackendError, ExportError};

/// Export format for the download endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Pdf,
    Svg,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Png, Self::Pdf, Self::Svg];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Pdf => "PDF",
            Self::Svg => "SVG",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }
}

/// Body of a download request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRequest {
    pub image_data: String,
    pub format: ExportFormat,
    pub filename: String,
}

impl ExportRequest {
    /// Name to save the returned payload under.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.filename, self.format.extension())
    }
}

/// File payload returned by the download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Write the payload into `dir`, creating the directory if needed.
    pub fn save_into(&self, dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// An image currently on display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedPlot {
    /// Base64 text exactly as the renderer sent it; reused for export.
    pub encoded: String,
    pub image: Vec<u8>,
}

/// Holds the displayed plot. Visible iff an image is held.
#[derive(Debug, Default, Clone)]
pub struct PlotView {
    plot: Option<DisplayedPlot>,
}

/// Default export name when the user leaves it blank, e.g. `plot_20240131_154502`.
pub fn default_export_name(now: DateTime<Local>) -> String {
    format!("plot_{}", now.format("%Y%m%d_%H%M%S"))
}

impl PlotView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and show an image, replacing whatever was shown. An image that
    /// does not decode leaves the current one in place.
    pub fn display(&mut self, encoded: &str) -> Result<(), BackendError> {
        let encoded = encoded.trim();
        // Accept a full data URL as well as bare base64.
        let payload = match encoded.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => encoded,
        };
        let image = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| BackendError::Malformed(format!("plot is not valid base64: {e}")))?;
        if image.is_empty() {
            return Err(BackendError::Malformed("plot image is empty".into()));
        }
        self.plot = Some(DisplayedPlot {
            encoded: payload.to_string(),
            image,
        });
        Ok(())
    }

    pub fn clear(&mut self) {
        self.plot = None;
    }

    pub fn is_visible(&self) -> bool {
        self.plot.is_some()
    }

    pub fn plot(&self) -> Option<&DisplayedPlot> {
        self.plot.as_ref()
    }

    /// Decoded PNG bytes of the displayed plot.
    pub fn decoded_image(&self) -> Option<&[u8]> {
        self.plot.as_ref().map(|p| p.image.as_slice())
    }

    /// Build the download request for the displayed plot. A blank filename
    /// is replaced by a timestamp-derived one; a trailing extension matching
    /// the format is dropped.
    pub fn export_request(
        &self,
        format: ExportFormat,
        filename: &str,
        now: DateTime<Local>,
    ) -> Result<ExportRequest, ExportError> {
        let plot = self.plot.as_ref().ok_or(ExportError::NoPlotAvailable)?;
        let mut name = filename.trim();
        if let Some((stem, ext)) = name.rsplit_once('.') {
            if !stem.is_empty() && ExportFormat::from_extension(ext) == Some(format) {
                name = stem;
            }
        }
        let filename = if name.is_empty() {
            default_export_name(now)
        } else {
            name.to_string()
        };
        Ok(ExportRequest {
            image_data: plot.encoded.clone(),
            format,
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PNG_B64: &str = "iVBORw0KGgo=";

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 31, 12, 0, 5).unwrap()
    }

    #[test]
    fn display_overwrites_previous_image() {
        let mut view = PlotView::new();
        assert!(!view.is_visible());
        view.display(PNG_B64).unwrap();
        assert_eq!(view.decoded_image().unwrap()[1..4], *b"PNG");
        view.display("QUJD").unwrap();
        assert_eq!(view.decoded_image(), Some(&b"ABC"[..]));
    }

    #[test]
    fn bad_image_keeps_current_plot() {
        let mut view = PlotView::new();
        view.display(PNG_B64).unwrap();
        assert!(view.display("not base64 !!").is_err());
        assert!(view.display("").is_err());
        assert_eq!(view.plot().unwrap().encoded, PNG_B64);
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let mut view = PlotView::new();
        view.display(&format!("data:image/png;base64,{PNG_B64}"))
            .unwrap();
        assert_eq!(view.plot().unwrap().encoded, PNG_B64);
    }

    #[test]
    fn clear_hides_plot() {
        let mut view = PlotView::new();
        view.display(PNG_B64).unwrap();
        view.clear();
        assert!(!view.is_visible());
        assert!(view.decoded_image().is_none());
    }

    #[test]
    fn export_without_plot_fails() {
        let view = PlotView::new();
        assert_eq!(
            view.export_request(ExportFormat::Png, "x", noon()),
            Err(ExportError::NoPlotAvailable)
        );
    }

    #[test]
    fn blank_filename_gets_timestamp() {
        let mut view = PlotView::new();
        view.display(PNG_B64).unwrap();
        let req = view.export_request(ExportFormat::Pdf, "  ", noon()).unwrap();
        assert_eq!(req.filename, "plot_20240131_120005");
        assert_eq!(req.file_name(), "plot_20240131_120005.pdf");
        assert_eq!(req.image_data, PNG_B64);
    }

    #[test]
    fn matching_extension_is_not_doubled() {
        let mut view = PlotView::new();
        view.display(PNG_B64).unwrap();
        let req = view
            .export_request(ExportFormat::Png, "chart.png", noon())
            .unwrap();
        assert_eq!(req.file_name(), "chart.png");
        let req = view
            .export_request(ExportFormat::Pdf, "chart.v2", noon())
            .unwrap();
        assert_eq!(req.file_name(), "chart.v2.pdf");
    }

    #[test]
    fn save_into_creates_missing_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().join("charts").join("2024");
        let file = ExportedFile {
            file_name: "plot.png".into(),
            format: ExportFormat::Png,
            bytes: b"\x89PNG".to_vec(),
        };
        let path = file.save_into(&dir).unwrap();
        assert_eq!(path, dir.join("plot.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
    }

    #[test]
    fn export_request_json_shape() {
        let req = ExportRequest {
            image_data: PNG_B64.into(),
            format: ExportFormat::Svg,
            filename: "out".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["image_data"], PNG_B64);
        assert_eq!(v["format"], "svg");
        assert_eq!(v["filename"], "out");
    }
}
