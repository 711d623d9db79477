//! Tabsets Manager
//!
//! Owns every tabset, keeps them in a key-value slot and switches between
//! them. Switching closes whatever the editor has open, files that snapshot
//! under the outgoing tabset and reopens the incoming one.

mod activation;
mod adapter;
mod error;
mod manager;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use activation::{wait_for_close, ActivationReport, CloseSignal};
pub use adapter::{AdapterError, DocumentHandle, EditorSurface};
pub use error::ManagerError;
pub use manager::{LoadRecovery, ManagerOptions, TabManager};

pub type Result<T> = std::result::Result<T, ManagerError>;
