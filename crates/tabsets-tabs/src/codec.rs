//! JSON interchange format
//!
//! The persisted slot holds an array of tabset records:
//!
//! ```text
//! [{"name": "0", "active": true, "tabs": [
//!     {"location": "file:///a.rs", "position": {"line": 3, "character": 0}, "layoutSlot": 1}
//! ]}]
//! ```
//!
//! Unknown fields are ignored on read; missing required fields are a
//! `TabError::Format`.

use crate::tab::Tab;
use crate::tabset::TabSet;
use crate::Result;

impl Tab {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl TabSet {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

pub fn encode_tabsets(tabsets: &[TabSet]) -> Result<String> {
    Ok(serde_json::to_string(tabsets)?)
}

pub fn decode_tabsets(text: &str) -> Result<Vec<TabSet>> {
    Ok(serde_json::from_str(text)?)
}

/// What `repair_active_flags` had to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveRepair {
    /// Exactly one tabset was active (or the list is empty)
    Consistent,
    /// No tabset was active; the first one was promoted
    PromotedFirst,
    /// Several were active; this many were cleared after the first
    ClearedExtra(usize),
}

/// Restore the single-active invariant on data read from disk.
pub fn repair_active_flags(tabsets: &mut [TabSet]) -> ActiveRepair {
    let active_count = tabsets.iter().filter(|s| s.is_active()).count();

    match active_count {
        1 => ActiveRepair::Consistent,
        0 => match tabsets.first_mut() {
            Some(first) => {
                first.set_active(true);
                ActiveRepair::PromotedFirst
            }
            None => ActiveRepair::Consistent,
        },
        n => {
            let mut seen = false;
            for tabset in tabsets.iter_mut().filter(|s| s.is_active()) {
                if seen {
                    tabset.set_active(false);
                }
                seen = true;
            }
            ActiveRepair::ClearedExtra(n - 1)
        }
    }
}
