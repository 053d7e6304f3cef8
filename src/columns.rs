//! Column registry: the ordered column names reported by the backend for the uploaded file.

use thiserror::Error;

/// A column name exactly as returned by the extraction backend.
pub type Column = String;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("the file has no columns")]
    Empty,
}

/// Ordered column names of the current file. Domain of both axis selectors.
///
/// Order and duplicates are kept verbatim. The registry is only ever replaced
/// as a whole.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnRegistry {
    columns: Vec<Column>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole registry. An empty list is rejected and leaves the
    /// previous contents in place.
    pub fn replace(&mut self, columns: Vec<Column>) -> Result<(), RegistryError> {
        if columns.is_empty() {
            return Err(RegistryError::Empty);
        }
        self.columns = columns;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Default X column: the first one, as a plain select element would show.
    pub fn first(&self) -> Option<&Column> {
        self.columns.first()
    }
}
