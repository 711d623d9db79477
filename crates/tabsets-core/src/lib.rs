//! Tabsets Core
//!
//! Host-facing layer: one `Workspace` owns the tab manager and runs the
//! `switch`, `new`, `delete`, `rename` and `reset` commands against the
//! host's editor and prompt surfaces.

mod commands;
mod config;
mod error;
mod prompt;
mod status;
mod workspace;

pub use commands::{CommandId, CommandOutcome};
pub use config::Config;
pub use error::CoreError;
pub use prompt::{PickItem, Prompter};
pub use status::{drive_status, status_text, StatusDisplay};
pub use workspace::Workspace;

// Re-export core components
pub use tabsets_manager::{
    ActivationReport, AdapterError, DocumentHandle, EditorSurface, LoadRecovery, ManagerError,
    ManagerOptions, TabManager,
};
pub use tabsets_storage::{Database, KeyValueStore, MemoryStore, StorageError};
pub use tabsets_tabs::{DocumentState, Position, Tab, TabError, TabSet};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
