//! The session controller: one owner for the column registry, the series
//! configuration set, chart options, the selected file and the displayed
//! plot, driven by [`SessionEvent`]s.
//!
//! Collaborator calls happen on deferred `Do*` events so the embedding loop
//! can redraw (e.g. show "Uploading...") before the call blocks. Each call
//! answers with a matching `*Finished` event.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::chart_options::{ChartOptionEdit, ChartOptions};
use crate::columns::{Column, ColumnRegistry};
use crate::compose::{compose, SelectedFile, VisualizationRequest};
use crate::error::{BackendError, ExportError, SessionError};
use crate::plot_view::{ExportFormat, ExportRequest, ExportedFile, PlotView};
use crate::series::{SeriesConfigSet, SeriesEdit};

/// Number of state transitions kept in the journal.
pub const TRANSITION_JOURNAL_CAPACITY: usize = 64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Idle,
    Uploading,
    ColumnsReady,
    Submitting,
    PlotReady,
    /// Transient; the session leaves it within the same event.
    Failed,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::ColumnsReady => "columns ready",
            Self::Submitting => "submitting",
            Self::PlotReady => "plot ready",
            Self::Failed => "failed",
        }
    }

    /// A collaborator exchange is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Uploading | Self::Submitting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    FileChosen(SelectedFile),
    DoUpload, // Internal: perform column extraction after the UI shows "Uploading"
    UploadFinished(Result<Vec<Column>, BackendError>),
    XColumnChanged(Option<Column>),
    YSelectionChanged(Vec<Column>),
    SeriesEdited(Column, SeriesEdit),
    ChartOptionChanged(ChartOptionEdit),
    SubmitRequested,
    DoRender(Box<VisualizationRequest>),
    RenderFinished(Result<String, BackendError>),
    ExportRequested {
        format: ExportFormat,
        filename: String,
    },
    DoExport(ExportRequest),
    ExportFinished(Result<ExportedFile, ExportError>),
    ClearPlot,
}

pub struct Session<B: Backend> {
    backend: B,
    registry: ColumnRegistry,
    selection: Vec<Column>,
    series: SeriesConfigSet,
    options: ChartOptions,
    /// Options a new upload starts from.
    initial_options: ChartOptions,
    file: Option<SelectedFile>,
    plot: PlotView,
    state: LifecycleState,
    last_error: Option<SessionError>,
    last_export: Option<ExportedFile>,
    transitions: VecDeque<Transition>,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B, options: ChartOptions) -> Self {
        Self {
            backend,
            registry: ColumnRegistry::new(),
            selection: Vec::new(),
            series: SeriesConfigSet::new(),
            initial_options: options.clone(),
            options,
            file: None,
            plot: PlotView::new(),
            state: LifecycleState::Idle,
            last_error: None,
            last_export: None,
            transitions: VecDeque::with_capacity(TRANSITION_JOURNAL_CAPACITY),
        }
    }

    pub fn with_defaults(backend: B) -> Self {
        Self::new(backend, ChartOptions::default())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    /// Current Y-axis selection, in selection order.
    pub fn selection(&self) -> &[Column] {
        &self.selection
    }

    pub fn series(&self) -> &SeriesConfigSet {
        &self.series
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn plot_view(&self) -> &PlotView {
        &self.plot
    }

    /// Whether the submit control accepts a click.
    pub fn submit_enabled(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::ColumnsReady | LifecycleState::PlotReady
        )
    }

    /// Whether the column/options panel is shown.
    pub fn panel_visible(&self) -> bool {
        !self.registry.is_empty()
            && matches!(
                self.state,
                LifecycleState::ColumnsReady
                    | LifecycleState::Submitting
                    | LifecycleState::PlotReady
                    | LifecycleState::Failed
            )
    }

    /// Take the most recent surfaced error, leaving none.
    pub fn take_error(&mut self) -> Option<SessionError> {
        self.last_error.take()
    }

    /// Take the most recently exported file, leaving none.
    pub fn take_export(&mut self) -> Option<ExportedFile> {
        self.last_export.take()
    }

    /// Recent state transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// Handle an event and every follow-up it produces.
    pub fn dispatch(&mut self, event: SessionEvent) {
        let mut next = Some(event);
        while let Some(event) = next {
            next = self.event(&event);
        }
    }

    pub fn event(&mut self, event: &SessionEvent) -> Option<SessionEvent> {
        match event {
            SessionEvent::FileChosen(file) => self.file_chosen(file),
            SessionEvent::DoUpload => {
                let file = self.file.as_ref()?;
                debug!(file = %file.name, "extracting columns");
                Some(SessionEvent::UploadFinished(
                    self.backend.extract_columns(file),
                ))
            }
            SessionEvent::UploadFinished(result) => {
                self.upload_finished(result.clone());
                None
            }
            SessionEvent::XColumnChanged(column) => {
                self.options.x_column = column
                    .as_ref()
                    .filter(|c| self.registry.contains(c))
                    .cloned();
                None
            }
            SessionEvent::YSelectionChanged(columns) => {
                self.set_selection(columns);
                None
            }
            SessionEvent::SeriesEdited(column, edit) => {
                if !self.series.edit(column, edit.clone()) {
                    debug!(%column, "ignoring edit for unselected series");
                }
                None
            }
            SessionEvent::ChartOptionChanged(edit) => {
                self.options.apply(edit.clone());
                None
            }
            SessionEvent::SubmitRequested => self.submit(),
            SessionEvent::DoRender(request) => {
                debug!(
                    kind = request.params.plot_kind.as_str(),
                    x = %request.params.x_column,
                    series = request.params.y_columns.len(),
                    "rendering"
                );
                Some(SessionEvent::RenderFinished(self.backend.render(request)))
            }
            SessionEvent::RenderFinished(result) => {
                self.render_finished(result);
                None
            }
            SessionEvent::ExportRequested { format, filename } => {
                match self
                    .plot
                    .export_request(*format, filename, chrono::Local::now())
                {
                    Ok(request) => Some(SessionEvent::DoExport(request)),
                    Err(e) => {
                        self.surface(SessionError::ExportFailed(e));
                        None
                    }
                }
            }
            SessionEvent::DoExport(request) => {
                let result = self
                    .backend
                    .export(request)
                    .map(|bytes| ExportedFile {
                        file_name: request.file_name(),
                        format: request.format,
                        bytes,
                    })
                    .map_err(ExportError::from);
                Some(SessionEvent::ExportFinished(result))
            }
            SessionEvent::ExportFinished(result) => {
                match result {
                    Ok(file) => {
                        info!(
                            file = %file.file_name,
                            format = file.format.as_str(),
                            bytes = file.bytes.len(),
                            "plot exported"
                        );
                        self.last_export = Some(file.clone());
                    }
                    Err(e) => self.surface(SessionError::ExportFailed(e.clone())),
                }
                None
            }
            SessionEvent::ClearPlot => {
                self.plot.clear();
                if self.state == LifecycleState::PlotReady {
                    self.set_state(LifecycleState::ColumnsReady);
                }
                None
            }
        }
    }

    fn file_chosen(&mut self, file: &SelectedFile) -> Option<SessionEvent> {
        if self.state.is_busy() {
            debug!(file = %file.name, state = self.state.as_str(), "file selection ignored while busy");
            return None;
        }
        self.reset_form();
        self.plot.clear();
        self.file = Some(file.clone());
        self.set_state(LifecycleState::Uploading);
        Some(SessionEvent::DoUpload)
    }

    fn upload_finished(&mut self, result: Result<Vec<Column>, BackendError>) {
        if self.state != LifecycleState::Uploading {
            warn!(state = self.state.as_str(), "unexpected upload completion");
            return;
        }
        let outcome = result.and_then(|columns| {
            self.registry
                .replace(columns)
                .map_err(|e| BackendError::Malformed(e.to_string()))
        });
        match outcome {
            Ok(()) => {
                info!(columns = self.registry.len(), "columns extracted");
                self.options.x_column = self.registry.first().cloned();
                self.set_state(LifecycleState::ColumnsReady);
            }
            Err(e) => {
                self.reset_form();
                self.file = None;
                self.set_state(LifecycleState::Idle);
                self.surface(SessionError::UploadFailed(e));
            }
        }
    }

    /// Replace the Y-axis selection and reconcile series configs in the same step.
    fn set_selection(&mut self, columns: &[Column]) {
        let mut selection: Vec<Column> = Vec::with_capacity(columns.len());
        for column in columns {
            if !self.registry.contains(column) {
                debug!(%column, "dropping unknown column from selection");
                continue;
            }
            if !selection.contains(column) {
                selection.push(column.clone());
            }
        }
        self.series = self.series.reconcile(&selection);
        self.selection = selection;
    }

    fn submit(&mut self) -> Option<SessionEvent> {
        if self.state.is_busy() {
            debug!(state = self.state.as_str(), "submit ignored while busy");
            return None;
        }
        match compose(
            &self.registry,
            &self.selection,
            &self.series,
            &self.options,
            self.file.as_ref(),
        ) {
            Ok(request) => {
                self.set_state(LifecycleState::Submitting);
                Some(SessionEvent::DoRender(Box::new(request)))
            }
            Err(e) => {
                self.surface(SessionError::CompositionInvalid(e));
                None
            }
        }
    }

    fn render_finished(&mut self, result: &Result<String, BackendError>) {
        if self.state != LifecycleState::Submitting {
            warn!(state = self.state.as_str(), "unexpected render completion");
            return;
        }
        let outcome = match result {
            Ok(encoded) => self.plot.display(encoded),
            Err(e) => Err(e.clone()),
        };
        match outcome {
            Ok(()) => self.set_state(LifecycleState::PlotReady),
            Err(e) => {
                self.set_state(LifecycleState::Failed);
                self.surface(SessionError::RenderFailed(e));
                let settled = if self.plot.is_visible() {
                    LifecycleState::PlotReady
                } else {
                    LifecycleState::ColumnsReady
                };
                self.set_state(settled);
            }
        }
    }

    fn reset_form(&mut self) {
        self.registry.clear();
        self.selection.clear();
        self.series = SeriesConfigSet::new();
        self.options = self.initial_options.clone();
        self.options.x_column = None;
    }

    fn set_state(&mut self, to: LifecycleState) {
        let from = self.state;
        if from == to {
            return;
        }
        info!(from = from.as_str(), to = to.as_str(), "state transition");
        if self.transitions.len() == TRANSITION_JOURNAL_CAPACITY {
            self.transitions.pop_front();
        }
        self.transitions.push_back(Transition { from, to });
        self.state = to;
    }

    fn surface(&mut self, error: SessionError) {
        warn!(error = %error, "{}", error.user_message());
        self.last_error = Some(error);
    }
}
