#![allow(dead_code)]

use seacanvas::{
    Backend, BackendError, Column, ExportRequest, SelectedFile, Session, SessionEvent,
    VisualizationRequest,
};
use std::cell::RefCell;
use std::collections::VecDeque;

pub const PNG_B64: &str = "iVBORw0KGgo=";

/// Backend double that replays scripted answers and records every call.
#[derive(Default)]
pub struct RecordingBackend {
    pub column_answers: RefCell<VecDeque<Result<Vec<Column>, BackendError>>>,
    pub render_answers: RefCell<VecDeque<Result<String, BackendError>>>,
    pub export_answers: RefCell<VecDeque<Result<Vec<u8>, BackendError>>>,
    pub uploads: RefCell<Vec<String>>,
    pub renders: RefCell<Vec<VisualizationRequest>>,
    pub exports: RefCell<Vec<ExportRequest>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(self, answer: Result<Vec<&str>, BackendError>) -> Self {
        self.column_answers
            .borrow_mut()
            .push_back(answer.map(|cols| cols.into_iter().map(String::from).collect()));
        self
    }

    pub fn plot(self, answer: Result<&str, BackendError>) -> Self {
        self.render_answers
            .borrow_mut()
            .push_back(answer.map(String::from));
        self
    }

    pub fn download(self, answer: Result<&[u8], BackendError>) -> Self {
        self.export_answers
            .borrow_mut()
            .push_back(answer.map(<[u8]>::to_vec));
        self
    }

    pub fn render_count(&self) -> usize {
        self.renders.borrow().len()
    }

    pub fn call_count(&self) -> usize {
        self.uploads.borrow().len() + self.renders.borrow().len() + self.exports.borrow().len()
    }
}

fn unscripted() -> BackendError {
    BackendError::Transport("no scripted answer".into())
}

impl Backend for RecordingBackend {
    fn extract_columns(&self, file: &SelectedFile) -> Result<Vec<Column>, BackendError> {
        self.uploads.borrow_mut().push(file.name.clone());
        self.column_answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }

    fn render(&self, request: &VisualizationRequest) -> Result<String, BackendError> {
        self.renders.borrow_mut().push(request.clone());
        self.render_answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }

    fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, BackendError> {
        self.exports.borrow_mut().push(request.clone());
        self.export_answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted()))
    }
}

pub fn weather_file() -> SelectedFile {
    SelectedFile::new("weather.csv", b"date,temp,humidity\n2024-01-01,3.5,80\n".to_vec())
}

pub fn columns(names: &[&str]) -> Vec<Column> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Session that has uploaded `weather.csv` and received `date, temp, humidity`.
pub fn uploaded_session(backend: RecordingBackend) -> Session<RecordingBackend> {
    let backend = backend.columns(Ok(vec!["date", "temp", "humidity"]));
    let mut session = Session::with_defaults(backend);
    session.dispatch(SessionEvent::FileChosen(weather_file()));
    session
}
