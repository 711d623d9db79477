//! Editor surface capability
//!
//! The manager never talks to an editor directly; hosts implement
//! `EditorSurface` over whatever their editor exposes.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use tabsets_tabs::{DocumentState, Tab};

/// Opaque reference to one open document, meaningful only to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle(pub String);

impl std::fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Could not open {location}: {reason}")]
    OpenFailed { location: String, reason: String },

    #[error("Could not close document: {0}")]
    CloseFailed(String),
}

#[async_trait]
pub trait EditorSurface: Send + Sync {
    /// Documents currently visible, in visible order.
    fn open_documents(&self) -> Vec<DocumentHandle>;

    /// The focused document, if any.
    fn active_document(&self) -> Option<DocumentHandle>;

    /// Location, cursor and layout slot of an open document.
    fn capture_state(&self, handle: &DocumentHandle) -> DocumentState;

    /// Ask the editor to close the focused document.
    ///
    /// Returning only means the request was accepted. Completion is
    /// signalled through `subscribe_active_changes`.
    async fn close_active_document(&self) -> Result<(), AdapterError>;

    /// Stream of focus changes, including transient `None`s while several
    /// documents close in a row.
    fn subscribe_active_changes(&self) -> broadcast::Receiver<Option<DocumentHandle>>;

    /// Open a tab's document. Cursor and layout slot are hints.
    async fn open_document(&self, tab: &Tab) -> Result<(), AdapterError>;
}
