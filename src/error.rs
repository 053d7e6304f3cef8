//! Error kinds surfaced by the session and their user-facing messages.
//!
//! Messages prefer the backend's own `detail` text and fall back to a fixed
//! per-kind message. Only the first line of any backend text is shown.

use std::io;
use std::path::Path;
use thiserror::Error;

const UPLOAD_FALLBACK: &str = "Failed to process file";
const RENDER_FALLBACK: &str = "Failed to generate visualization";
const EXPORT_FALLBACK: &str = "Failed to download plot";

/// Failure talking to one of the backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Non-2xx answer. `detail` is the backend's message, if it sent one.
    #[error("backend returned {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("request failed: {0}")]
    Transport(String),
    /// 2xx answer that does not follow the contract (bad JSON, missing field).
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Message provided by the backend itself, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => Some(first_line(detail)).filter(|d| !d.is_empty()),
            _ => None,
        }
    }
}

/// Reasons a request cannot be composed. Checked before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("no file selected")]
    NoFileSelected,
    #[error("no X-axis column selected")]
    NoXColumn,
    #[error("no Y-axis column selected")]
    EmptySeriesSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("no plot available")]
    NoPlotAvailable,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Every error the session surfaces. None of them ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("upload failed: {0}")]
    UploadFailed(BackendError),
    #[error("invalid request: {0}")]
    CompositionInvalid(#[from] CompositionError),
    #[error("render failed: {0}")]
    RenderFailed(BackendError),
    #[error("export failed: {0}")]
    ExportFailed(#[from] ExportError),
}

impl SessionError {
    /// One-line message for the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::UploadFailed(e) => format!(
                "Error processing file: {}",
                e.detail().unwrap_or(UPLOAD_FALLBACK)
            ),
            Self::CompositionInvalid(e) => match e {
                CompositionError::NoFileSelected => "Please select a file first".to_string(),
                CompositionError::NoXColumn => "Please select an X-axis column".to_string(),
                CompositionError::EmptySeriesSelection => {
                    "Please select at least one Y-axis column".to_string()
                }
            },
            Self::RenderFailed(e) => format!(
                "Error generating visualization: {}",
                e.detail().unwrap_or(RENDER_FALLBACK)
            ),
            Self::ExportFailed(ExportError::NoPlotAvailable) => "No plot to download".to_string(),
            Self::ExportFailed(ExportError::Backend(e)) => format!(
                "Error downloading plot: {}",
                e.detail().unwrap_or(EXPORT_FALLBACK)
            ),
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", first_line(d)))
        .unwrap_or_default()
}

fn first_line(s: &str) -> &str {
    s.lines().next().map(str::trim).unwrap_or("")
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, path: Option<&Path>) -> String {
    use std::io::ErrorKind;

    let base = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        _ => err.to_string(),
    };

    match path {
        Some(p) => format!("{}: {}", p.display(), base),
        None => base,
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find a SessionError or io::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report) -> String {
    for cause in report.chain() {
        if let Some(se) = cause.downcast_ref::<SessionError>() {
            return se.user_message();
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            let msg = user_message_from_io(io_err, None);
            let context = report.to_string();
            let context = first_line(&context);
            return if context.is_empty() || context == io_err.to_string() {
                msg
            } else {
                format!("{context}: {msg}")
            };
        }
    }

    // Fallback: use first line of display to avoid long tracebacks
    let display = report.to_string();
    let trimmed = first_line(&display);
    if trimmed.is_empty() {
        "An error occurred".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_message_uses_backend_detail() {
        let err = SessionError::UploadFailed(BackendError::Status {
            status: 400,
            detail: Some("Unsupported file format: .txt\ntraceback...".into()),
        });
        assert_eq!(
            err.user_message(),
            "Error processing file: Unsupported file format: .txt"
        );
    }

    #[test]
    fn upload_message_falls_back_without_detail() {
        for backend in [
            BackendError::Status {
                status: 500,
                detail: None,
            },
            BackendError::Status {
                status: 500,
                detail: Some("  ".into()),
            },
            BackendError::Transport("connection refused".into()),
            BackendError::Malformed("missing columns".into()),
        ] {
            let msg = SessionError::UploadFailed(backend).user_message();
            assert_eq!(msg, "Error processing file: Failed to process file");
        }
    }

    #[test]
    fn render_and_export_messages() {
        let render = SessionError::RenderFailed(BackendError::Malformed("no plot".into()));
        assert_eq!(
            render.user_message(),
            "Error generating visualization: Failed to generate visualization"
        );
        let none = SessionError::from(ExportError::NoPlotAvailable);
        assert_eq!(none.user_message(), "No plot to download");
        let backend = SessionError::from(ExportError::Backend(BackendError::Status {
            status: 422,
            detail: Some("bad format".into()),
        }));
        assert_eq!(backend.user_message(), "Error downloading plot: bad format");
    }

    #[test]
    fn composition_messages() {
        let err = SessionError::from(CompositionError::NoFileSelected);
        assert_eq!(err.user_message(), "Please select a file first");
        assert!(matches!(
            err,
            SessionError::CompositionInvalid(CompositionError::NoFileSelected)
        ));
    }

    #[test]
    fn test_user_message_from_io_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "No such file");
        let msg = user_message_from_io(&err, Some(Path::new("data.csv")));
        assert_eq!(msg, "data.csv: File or directory not found.");
    }

    #[test]
    fn test_user_message_from_report_finds_session_error() {
        let report = color_eyre::eyre::Report::new(SessionError::RenderFailed(
            BackendError::Status {
                status: 400,
                detail: Some("KeyError: 'temp'".into()),
            },
        ));
        assert_eq!(
            user_message_from_report(&report),
            "Error generating visualization: KeyError: 'temp'"
        );
    }
}
