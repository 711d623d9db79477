//! Tab error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Malformed tabset data: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Tabset name cannot be empty")]
    EmptyName,
}
