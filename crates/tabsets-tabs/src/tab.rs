//! Tab data structure
//!
//! A tab records where a document lives, where its cursor was and which
//! layout slot it occupied. It is never mutated after construction.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Zero-based cursor position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// What the editor reports about one open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    /// Resource identifier, typically a URI
    pub location: String,
    /// Primary cursor
    pub position: Position,
    /// Layout column, when the editor exposes one
    pub layout_slot: Option<NonZeroU32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    location: String,
    position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layout_slot: Option<NonZeroU32>,
}

impl Tab {
    pub fn new(
        location: impl Into<String>,
        position: Position,
        layout_slot: Option<NonZeroU32>,
    ) -> Self {
        Self {
            location: location.into(),
            position,
            layout_slot,
        }
    }

    /// Snapshot a currently open document.
    pub fn capture(document: &DocumentState) -> Self {
        Self::new(
            document.location.clone(),
            document.position,
            document.layout_slot,
        )
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn layout_slot(&self) -> Option<NonZeroU32> {
        self.layout_slot
    }
}
