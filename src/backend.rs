//! Backend collaborators: column extraction, chart rendering and export.
//!
//! [`Backend`] is the seam the session talks through. [`HttpBackend`] speaks
//! the HTTP contract; tests substitute an in-memory implementation.

use serde::Deserialize;
use serde_json::Value;

use crate::columns::Column;
use crate::compose::{SelectedFile, VisualizationRequest};
use crate::error::BackendError;
use crate::plot_view::ExportRequest;

pub trait Backend {
    /// Upload the file and return its column names in file order.
    fn extract_columns(&self, file: &SelectedFile) -> Result<Vec<Column>, BackendError>;

    /// Render the chart and return the base64-encoded image.
    fn render(&self, request: &VisualizationRequest) -> Result<String, BackendError>;

    /// Convert an encoded image to the requested format and return the file payload.
    fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, BackendError>;
}

#[derive(Deserialize)]
struct ColumnsBody {
    columns: Option<Value>,
}

#[derive(Deserialize)]
struct RenderBody {
    plot: Option<Value>,
}

/// Parse a successful column-extraction body: `{"columns": ["a", "b", ...]}`.
/// Anything but a non-empty list of strings is malformed.
pub fn parse_columns_body(body: &str) -> Result<Vec<Column>, BackendError> {
    let parsed: ColumnsBody = serde_json::from_str(body)
        .map_err(|e| BackendError::Malformed(format!("invalid JSON: {e}")))?;
    let Some(Value::Array(items)) = parsed.columns else {
        return Err(BackendError::Malformed("missing columns list".into()));
    };
    if items.is_empty() {
        return Err(BackendError::Malformed("empty columns list".into()));
    }
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(BackendError::Malformed(format!(
                "column name is not a string: {other}"
            ))),
        })
        .collect()
}

/// Parse a successful render body: `{"plot": "<base64>"}`.
pub fn parse_render_body(body: &str) -> Result<String, BackendError> {
    let parsed: RenderBody = serde_json::from_str(body)
        .map_err(|e| BackendError::Malformed(format!("invalid JSON: {e}")))?;
    match parsed.plot {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        _ => Err(BackendError::Malformed("response has no plot image".into())),
    }
}

/// Extract the backend's message from an error body.
///
/// Understands `{"detail": "..."}` and validation-error lists
/// (`{"detail": [{"msg": "..."}, ...]}`); plain text bodies are used as is.
pub fn error_detail_from_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Some(body.to_string());
    };
    let detail = match value.get("detail")? {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|i| i.get("msg").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => return None,
        other => other.to_string(),
    };
    Some(detail).filter(|d| !d.trim().is_empty())
}

#[cfg(feature = "http")]
pub use http::HttpBackend;

#[cfg(feature = "http")]
mod http {
    use super::*;
    use crate::config::BackendConfig;
    use reqwest::blocking::{multipart, Client, Response};
    use std::time::Duration;
    use tracing::debug;

    /// Blocking HTTP client for the three backend endpoints.
    pub struct HttpBackend {
        client: Client,
        config: BackendConfig,
    }

    impl HttpBackend {
        pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            Ok(Self { client, config })
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
        }

        fn file_part(file: &SelectedFile) -> multipart::Part {
            multipart::Part::bytes(file.bytes.as_ref().clone()).file_name(file.name.clone())
        }

        /// Turn a non-2xx response into a `Status` error carrying the backend's detail.
        fn check(response: Response) -> Result<Response, BackendError> {
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            let body = response.text().unwrap_or_default();
            Err(BackendError::Status {
                status: status.as_u16(),
                detail: error_detail_from_body(&body),
            })
        }

        fn body_text(response: Response) -> Result<String, BackendError> {
            response
                .text()
                .map_err(|e| BackendError::Transport(e.to_string()))
        }
    }

    fn transport(e: reqwest::Error) -> BackendError {
        BackendError::Transport(e.to_string())
    }

    impl Backend for HttpBackend {
        fn extract_columns(&self, file: &SelectedFile) -> Result<Vec<Column>, BackendError> {
            let url = self.url(&self.config.columns_path);
            debug!(%url, file = %file.name, bytes = file.len(), "uploading file for column extraction");
            let form = multipart::Form::new().part(self.config.file_field.clone(), Self::file_part(file));
            let response = self
                .client
                .post(&url)
                .multipart(form)
                .send()
                .map_err(transport)?;
            let body = Self::body_text(Self::check(response)?)?;
            parse_columns_body(&body)
        }

        fn render(&self, request: &VisualizationRequest) -> Result<String, BackendError> {
            let url = self.url(&self.config.render_path);
            let params = request
                .params
                .to_json()
                .map_err(|e| BackendError::Malformed(format!("could not encode parameters: {e}")))?;
            debug!(%url, plot_kind = ?request.params.plot_kind, series = request.params.y_columns.len(), "requesting render");
            let params_part = multipart::Part::text(params)
                .mime_str("application/json")
                .map_err(transport)?;
            let form = multipart::Form::new()
                .part(self.config.file_field.clone(), Self::file_part(&request.file))
                .part(self.config.params_field.clone(), params_part);
            let response = self
                .client
                .post(&url)
                .multipart(form)
                .send()
                .map_err(transport)?;
            let body = Self::body_text(Self::check(response)?)?;
            parse_render_body(&body)
        }

        fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, BackendError> {
            let url = self.url(&self.config.download_path);
            debug!(%url, format = request.format.extension(), filename = %request.filename, "requesting export");
            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .map_err(transport)?;
            let bytes = Self::check(response)?.bytes().map_err(transport)?;
            Ok(bytes.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_body_preserves_order_and_duplicates() {
        let cols = parse_columns_body(r#"{"columns": ["date", "temp", "date"]}"#).unwrap();
        assert_eq!(cols, vec!["date", "temp", "date"]);
    }

    #[test]
    fn columns_body_rejects_bad_shapes() {
        for body in [
            r#"{"columns": []}"#,
            r#"{"columns": "date,temp"}"#,
            r#"{"columns": ["a", 1]}"#,
            r#"{"message": "ok"}"#,
            "not json",
        ] {
            assert!(
                matches!(parse_columns_body(body), Err(BackendError::Malformed(_))),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn render_body_requires_plot() {
        assert_eq!(parse_render_body(r#"{"plot": "QUJD"}"#).unwrap(), "QUJD");
        assert!(parse_render_body(r#"{"status": "ok"}"#).is_err());
        assert!(parse_render_body(r#"{"plot": ""}"#).is_err());
        assert!(parse_render_body(r#"{"plot": null}"#).is_err());
    }

    #[test]
    fn error_detail_variants() {
        assert_eq!(
            error_detail_from_body(r#"{"detail": "Unsupported file format: .txt"}"#).as_deref(),
            Some("Unsupported file format: .txt")
        );
        assert_eq!(
            error_detail_from_body(
                r#"{"detail": [{"msg": "field required"}, {"msg": "value is not a valid float"}]}"#
            )
            .as_deref(),
            Some("field required; value is not a valid float")
        );
        assert_eq!(
            error_detail_from_body("Internal Server Error").as_deref(),
            Some("Internal Server Error")
        );
        assert_eq!(error_detail_from_body(r#"{"error": "x"}"#), None);
        assert_eq!(error_detail_from_body(""), None);
    }
}
