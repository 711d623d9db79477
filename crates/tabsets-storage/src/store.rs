//! Key-value store capability
//!
//! The tabset manager is bound to one string slot in one of these.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::database::Database;
use crate::Result;

pub trait KeyValueStore: Send + Sync {
    /// Read a slot, returning `default` when it has never been written.
    fn get(&self, key: &str, default: &str) -> Result<String>;

    /// Overwrite a slot.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl KeyValueStore for Database {
    fn get(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)
    }
}

/// In-memory store that keeps every write it receives.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one slot, without recording it as a write.
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Current value of a slot, if any.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    /// Every value written to `key`, oldest first.
    pub fn writes_for(&self, key: &str) -> Vec<String> {
        self.writes
            .lock()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .values
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        self.writes
            .lock()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}
