//! TabSet data structure

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TabError;
use crate::tab::Tab;
use crate::Result;

/// Name of the tabset synthesized when the store holds none.
pub const SEED_TABSET_NAME: &str = "0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TabSetRecord")]
pub struct TabSet {
    /// Process-local identifier; never persisted
    #[serde(skip)]
    id: String,
    /// Display name chosen by the user
    name: String,
    /// Whether this is the current working context
    active: bool,
    /// Tabs in reopen order
    tabs: Vec<Tab>,
}

/// Wire shape of a tabset. Every field is required.
#[derive(Deserialize)]
struct TabSetRecord {
    name: String,
    active: bool,
    tabs: Vec<Tab>,
}

impl TryFrom<TabSetRecord> for TabSet {
    type Error = TabError;

    fn try_from(record: TabSetRecord) -> Result<Self> {
        let mut tabset = Self::new(record.name)?;
        tabset.active = record.active;
        tabset.tabs = record.tabs;
        Ok(tabset)
    }
}

impl TabSet {
    /// Create an empty, inactive tabset.
    pub fn new(name: String) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(TabError::EmptyName);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            active: false,
            tabs: Vec::new(),
        })
    }

    /// The tabset every fresh store starts with.
    pub fn seed() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: SEED_TABSET_NAME.to_string(),
            active: true,
            tabs: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn rename(&mut self, name: String) -> Result<()> {
        if name.trim().is_empty() {
            return Err(TabError::EmptyName);
        }
        self.name = name;
        Ok(())
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Replace the whole tab list, returning the previous one.
    pub fn replace_tabs(&mut self, tabs: Vec<Tab>) -> Vec<Tab> {
        std::mem::replace(&mut self.tabs, tabs)
    }
}

// The id only distinguishes instances within one process.
impl PartialEq for TabSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.active == other.active && self.tabs == other.tabs
    }
}

impl Eq for TabSet {}
