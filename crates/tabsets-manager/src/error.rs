//! Manager error types

use thiserror::Error;

use crate::adapter::AdapterError;
use tabsets_tabs::TabError;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Corrupt tabset data: {0}")]
    Format(#[source] TabError),

    #[error("No active tabset found; reset tabsets to recover")]
    NoActiveTabSet,

    #[error("Tabset not found: {0}")]
    NotFound(String),

    #[error("Tabset name cannot be empty")]
    EmptyName,

    #[error("Tabset '{0}' is already active")]
    AlreadyActive(String),

    #[error("Cannot delete the active tabset '{0}'")]
    CannotDeleteActive(String),

    #[error("Cannot delete every tabset")]
    CannotDeleteLast,

    #[error("Editor error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Storage error: {0}")]
    Storage(#[from] tabsets_storage::StorageError),
}

impl ManagerError {
    /// Errors that reject a request without touching any state.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            ManagerError::NotFound(_)
                | ManagerError::EmptyName
                | ManagerError::AlreadyActive(_)
                | ManagerError::CannotDeleteActive(_)
                | ManagerError::CannotDeleteLast
        )
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, ManagerError::NoActiveTabSet)
    }
}

impl From<TabError> for ManagerError {
    fn from(err: TabError) -> Self {
        match err {
            TabError::EmptyName => ManagerError::EmptyName,
            other => ManagerError::Format(other),
        }
    }
}
