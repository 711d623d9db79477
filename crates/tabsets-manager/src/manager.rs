//! Tab Manager
//!
//! Sole owner of the tabset list. Every mutation is written back to the
//! store slot before the call returns, and each write publishes the active
//! tabset name on a watch channel for status displays.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use tabsets_storage::KeyValueStore;
use tabsets_tabs::{decode_tabsets, encode_tabsets, repair_active_flags, ActiveRepair, TabSet};

use crate::activation::{self, ActivationReport};
use crate::adapter::EditorSurface;
use crate::error::ManagerError;
use crate::Result;

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Store slot holding the serialized tabset list
    pub store_key: String,
    /// Upper bound on each close confirmation wait
    pub close_timeout: Duration,
    /// Consecutive waits without progress before closing is abandoned
    pub close_stall_limit: u32,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            store_key: "tabsets".to_string(),
            close_timeout: Duration::from_millis(200),
            close_stall_limit: 3,
        }
    }
}

/// Set when the stored list could not be decoded and was reseeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRecovery {
    /// Why decoding failed
    pub error: String,
    /// Slot the unreadable text was copied to
    pub backup_key: String,
}

pub struct TabManager {
    /// All tabsets in creation order
    tabsets: Vec<TabSet>,
    /// Persistent slot
    store: Arc<dyn KeyValueStore>,
    options: ManagerOptions,
    /// Active tabset name, republished on every persist
    status: watch::Sender<Option<String>>,
    recovery: Option<LoadRecovery>,
}

impl TabManager {
    /// Load tabsets from the store, seeding `"0"` when there are none.
    ///
    /// Unreadable data is copied to `<store_key>.corrupt` and replaced by the
    /// seed; `recovery()` reports when that happened.
    pub fn load(store: Arc<dyn KeyValueStore>, options: ManagerOptions) -> Result<Self> {
        let (status, _) = watch::channel(None);
        let mut manager = Self {
            tabsets: Vec::new(),
            store,
            options,
            status,
            recovery: None,
        };
        manager.reload()?;

        tracing::info!(
            store_key = %manager.options.store_key,
            tabset_count = manager.tabsets.len(),
            "Loaded tabsets"
        );

        Ok(manager)
    }

    fn reload(&mut self) -> Result<()> {
        let key = &self.options.store_key;
        let raw = self.store.get(key, "[]")?;

        let mut tabsets = match decode_tabsets(&raw) {
            Ok(tabsets) => tabsets,
            Err(err) => {
                let backup_key = format!("{key}.corrupt");
                self.store.set(&backup_key, &raw)?;
                tracing::warn!(
                    error = %err,
                    backup_key = %backup_key,
                    "Stored tabsets are corrupt; starting from a fresh tabset"
                );
                self.recovery = Some(LoadRecovery {
                    error: err.to_string(),
                    backup_key,
                });
                Vec::new()
            }
        };

        if tabsets.is_empty() {
            tabsets.push(TabSet::seed());
        }

        match repair_active_flags(&mut tabsets) {
            ActiveRepair::Consistent => {}
            ActiveRepair::PromotedFirst => {
                tracing::warn!("No stored tabset was active; activating the first one")
            }
            ActiveRepair::ClearedExtra(n) => {
                tracing::warn!(cleared = n, "Several stored tabsets were active; keeping the first")
            }
        }

        self.tabsets = tabsets;
        self.publish_status();
        Ok(())
    }

    pub fn recovery(&self) -> Option<&LoadRecovery> {
        self.recovery.as_ref()
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    /// All tabsets in creation order.
    pub fn tabsets(&self) -> &[TabSet] {
        &self.tabsets
    }

    pub fn get(&self, id: &str) -> Result<&TabSet> {
        self.tabsets
            .iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| ManagerError::NotFound(id.to_string()))
    }

    /// Every tabset except the active one, in manager order.
    pub fn list_inactive(&self) -> Vec<TabSet> {
        self.tabsets
            .iter()
            .filter(|s| !s.is_active())
            .cloned()
            .collect()
    }

    pub fn find_active(&self) -> Result<&TabSet> {
        self.tabsets
            .iter()
            .find(|s| s.is_active())
            .ok_or(ManagerError::NoActiveTabSet)
    }

    /// Receiver that sees the active tabset name after every persist.
    pub fn subscribe_status(&self) -> watch::Receiver<Option<String>> {
        self.status.subscribe()
    }

    /// Write the full list to the store and notify status observers.
    pub fn persist(&self) -> Result<()> {
        let encoded = encode_tabsets(&self.tabsets)?;
        self.store.set(&self.options.store_key, &encoded)?;
        self.publish_status();

        tracing::debug!(tabset_count = self.tabsets.len(), "Persisted tabsets");

        Ok(())
    }

    fn publish_status(&self) {
        let active = self
            .tabsets
            .iter()
            .find(|s| s.is_active())
            .map(|s| s.name().to_string());
        self.status.send_replace(active);
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.tabsets
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| ManagerError::NotFound(id.to_string()))
    }

    fn active_index(&self) -> Result<usize> {
        self.tabsets
            .iter()
            .position(|s| s.is_active())
            .ok_or(ManagerError::NoActiveTabSet)
    }

    /// Switch the working context to `target_id`.
    ///
    /// Open documents are captured and closed, stored as the outgoing
    /// tabset's tabs, the flags flip, the list is persisted and only then
    /// are the target's tabs reopened. Reopen failures are reported, not
    /// returned as errors.
    pub async fn activate(
        &mut self,
        target_id: &str,
        editor: &dyn EditorSurface,
    ) -> Result<ActivationReport> {
        let outgoing = self.active_index()?;
        let target = self.index_of(target_id)?;
        if outgoing == target {
            return Err(ManagerError::AlreadyActive(
                self.tabsets[target].name().to_string(),
            ));
        }

        tracing::debug!(
            from = %self.tabsets[outgoing].name(),
            to = %self.tabsets[target].name(),
            "Switching tabset"
        );

        let (snapshot, left_open) = activation::capture_and_close(
            editor,
            self.options.close_timeout,
            self.options.close_stall_limit,
        )
        .await;
        let captured = snapshot.len();

        let previous = &mut self.tabsets[outgoing];
        previous.replace_tabs(snapshot);
        previous.set_active(false);
        self.tabsets[target].set_active(true);

        self.persist()?;

        let tabs = self.tabsets[target].tabs().to_vec();
        let (reopened, failures) = activation::reopen(editor, &tabs).await;

        tracing::info!(
            tabset = %self.tabsets[target].name(),
            captured,
            reopened,
            failed = failures.len(),
            left_open,
            "Activated tabset"
        );

        Ok(ActivationReport {
            captured,
            reopened,
            failures,
            left_open,
        })
    }

    /// Append a new, inactive tabset.
    pub fn create(&mut self, name: String) -> Result<TabSet> {
        let tabset = TabSet::new(name)?;
        self.tabsets.push(tabset.clone());
        self.persist()?;

        tracing::info!(tabset = %tabset.name(), "Created tabset");

        Ok(tabset)
    }

    pub fn rename(&mut self, id: &str, name: String) -> Result<()> {
        let index = self.index_of(id)?;
        let old_name = self.tabsets[index].name().to_string();
        self.tabsets[index].rename(name)?;
        self.persist()?;

        tracing::info!(from = %old_name, to = %self.tabsets[index].name(), "Renamed tabset");

        Ok(())
    }

    /// Remove the given tabsets. Nothing changes if any check fails.
    pub fn delete(&mut self, ids: &[String]) -> Result<Vec<TabSet>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for id in &targets {
            self.index_of(id)?;
        }

        if targets.len() >= self.tabsets.len() {
            return Err(ManagerError::CannotDeleteLast);
        }
        if let Some(active) = self
            .tabsets
            .iter()
            .find(|s| s.is_active() && targets.contains(s.id()))
        {
            return Err(ManagerError::CannotDeleteActive(active.name().to_string()));
        }

        let (removed, kept): (Vec<TabSet>, Vec<TabSet>) = std::mem::take(&mut self.tabsets)
            .into_iter()
            .partition(|s| targets.contains(s.id()));
        self.tabsets = kept;
        self.persist()?;

        for tabset in &removed {
            tracing::info!(tabset = %tabset.name(), "Deleted tabset");
        }

        Ok(removed)
    }

    /// Drop every tabset, persist the empty list, then reseed from the store.
    pub fn reset(&mut self) -> Result<()> {
        self.recovery = None;
        self.tabsets.clear();
        self.persist()?;
        self.reload()?;
        self.persist()?;

        tracing::info!("Reset tabsets");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEditor;
    use tabsets_storage::MemoryStore;
    use tokio::time::Instant;

    const KEY: &str = "tabsets";

    fn manager_with(store: &Arc<MemoryStore>) -> TabManager {
        TabManager::load(store.clone(), ManagerOptions::default()).unwrap()
    }

    fn assert_single_active(manager: &TabManager) {
        let active = manager.tabsets().iter().filter(|s| s.is_active()).count();
        assert_eq!(active, 1);
        assert!(!manager.tabsets().is_empty());
    }

    fn names(tabsets: &[TabSet]) -> Vec<String> {
        tabsets.iter().map(|s| s.name().to_string()).collect()
    }

    #[test]
    fn test_load_empty_list_seeds_default() {
        let store = Arc::new(MemoryStore::with_value(KEY, "[]"));
        let manager = manager_with(&store);

        assert_eq!(manager.tabsets().len(), 1);
        let active = manager.find_active().unwrap();
        assert_eq!(active.name(), "0");
        assert!(active.tabs().is_empty());
        assert!(manager.list_inactive().is_empty());
        assert!(manager.recovery().is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_load_missing_slot_seeds_default() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(&store);
        assert_eq!(manager.find_active().unwrap().name(), "0");
    }

    #[test]
    fn test_load_corrupt_data_backs_up_and_reseeds() {
        let store = Arc::new(MemoryStore::with_value(KEY, r#"[{"name":"work"}]"#));
        let manager = manager_with(&store);

        let recovery = manager.recovery().unwrap();
        assert_eq!(recovery.backup_key, "tabsets.corrupt");
        assert_eq!(
            store.value("tabsets.corrupt").as_deref(),
            Some(r#"[{"name":"work"}]"#)
        );
        assert_eq!(manager.find_active().unwrap().name(), "0");
        assert_single_active(&manager);
    }

    #[test]
    fn test_load_repairs_active_flags() {
        let store = Arc::new(MemoryStore::with_value(
            KEY,
            r#"[{"name":"a","active":false,"tabs":[]},{"name":"b","active":false,"tabs":[]}]"#,
        ));
        let manager = manager_with(&store);
        assert_eq!(manager.find_active().unwrap().name(), "a");

        let store = Arc::new(MemoryStore::with_value(
            KEY,
            r#"[{"name":"a","active":false,"tabs":[]},{"name":"b","active":true,"tabs":[]},{"name":"c","active":true,"tabs":[]}]"#,
        ));
        let manager = manager_with(&store);
        assert_eq!(manager.find_active().unwrap().name(), "b");
        assert_single_active(&manager);
    }

    #[test]
    fn test_find_active_reports_invariant_violation() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        manager.tabsets.clear();

        assert!(matches!(
            manager.find_active(),
            Err(ManagerError::NoActiveTabSet)
        ));
        assert!(manager.find_active().unwrap_err().is_invariant_violation());
    }

    #[test]
    fn test_create_and_rename() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);

        let work = manager.create("work".to_string()).unwrap();
        assert!(!work.is_active());
        assert_eq!(names(manager.tabsets()), vec!["0", "work"]);
        assert_eq!(names(&manager.list_inactive()), vec!["work"]);

        manager.rename(work.id(), "feature-a".to_string()).unwrap();
        assert_eq!(manager.get(work.id()).unwrap().name(), "feature-a");
        assert!(store.value(KEY).unwrap().contains("feature-a"));

        let writes = store.write_count();
        assert!(matches!(
            manager.create("  ".to_string()),
            Err(ManagerError::EmptyName)
        ));
        assert!(manager.rename(work.id(), String::new()).is_err());
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_delete_refuses_active_and_last() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        let seed_id = manager.find_active().unwrap().id().to_string();
        let other = manager.create("other".to_string()).unwrap();

        let before = manager.tabsets().to_vec();
        let writes = store.write_count();

        let err = manager.delete(&[seed_id.clone()]).unwrap_err();
        assert!(matches!(err, ManagerError::CannotDeleteActive(_)));
        assert!(err.is_invalid_operation());

        let err = manager
            .delete(&[seed_id.clone(), other.id().to_string()])
            .unwrap_err();
        assert!(matches!(err, ManagerError::CannotDeleteLast));

        let err = manager.delete(&["missing".to_string()]).unwrap_err();
        assert!(matches!(err, ManagerError::NotFound(_)));

        assert_eq!(manager.tabsets(), before.as_slice());
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_delete_inactive() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        let a = manager.create("a".to_string()).unwrap();
        manager.create("b".to_string()).unwrap();
        let c = manager.create("c".to_string()).unwrap();

        let removed = manager
            .delete(&[a.id().to_string(), c.id().to_string()])
            .unwrap();
        assert_eq!(names(&removed), vec!["a", "c"]);
        assert_eq!(names(manager.tabsets()), vec!["0", "b"]);
        assert_single_active(&manager);

        let reloaded = manager_with(&store);
        assert_eq!(names(reloaded.tabsets()), vec!["0", "b"]);
    }

    #[test]
    fn test_reset_reseeds_and_persists_both_states() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        manager.create("a".to_string()).unwrap();
        manager.create("b".to_string()).unwrap();
        let writes_before = store.writes_for(KEY).len();

        manager.reset().unwrap();

        assert_eq!(manager.tabsets().len(), 1);
        let active = manager.find_active().unwrap();
        assert_eq!(active.name(), "0");
        assert!(active.tabs().is_empty());

        let writes = store.writes_for(KEY);
        assert_eq!(writes.len(), writes_before + 2);
        assert_eq!(writes[writes_before], "[]");
        assert_eq!(
            writes[writes_before + 1],
            r#"[{"name":"0","active":true,"tabs":[]}]"#
        );
    }

    #[test]
    fn test_reset_clears_load_recovery() {
        let store = Arc::new(MemoryStore::with_value(KEY, "{not json"));
        let mut manager = manager_with(&store);
        assert!(manager.recovery().is_some());

        manager.reset().unwrap();
        assert!(manager.recovery().is_none());
        assert_eq!(store.value("tabsets.corrupt").as_deref(), Some("{not json"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invariants_hold_across_mixed_operations() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        let editor = ScriptedEditor::new();
        editor.open("file:///notes.md", 0, 0, None);
        assert_single_active(&manager);

        let work = manager.create("work".to_string()).unwrap();
        assert_single_active(&manager);
        let spare = manager.create("spare".to_string()).unwrap();
        assert_single_active(&manager);

        manager.activate(work.id(), &editor).await.unwrap();
        assert_single_active(&manager);
        editor.open("file:///work.rs", 5, 0, None);

        manager.rename(work.id(), "feature-a".to_string()).unwrap();
        assert_single_active(&manager);

        assert!(manager.delete(&[work.id().to_string()]).is_err());
        assert_single_active(&manager);
        let all: Vec<String> = manager
            .tabsets()
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert!(manager.delete(&all).is_err());
        assert_single_active(&manager);

        let seed_id = manager.list_inactive()[0].id().to_string();
        manager.activate(&seed_id, &editor).await.unwrap();
        assert_single_active(&manager);
        assert_eq!(editor.open_locations(), vec!["file:///notes.md"]);

        manager.delete(&[spare.id().to_string()]).unwrap();
        assert_single_active(&manager);
        assert!(manager.activate(spare.id(), &editor).await.is_err());
        assert_single_active(&manager);

        let feature_id = manager.list_inactive()[0].id().to_string();
        manager.activate(&feature_id, &editor).await.unwrap();
        assert_single_active(&manager);
        assert_eq!(manager.find_active().unwrap().name(), "feature-a");
        assert_eq!(editor.open_locations(), vec!["file:///work.rs"]);

        manager.reset().unwrap();
        assert_single_active(&manager);
        manager.create("after-reset".to_string()).unwrap();
        assert_single_active(&manager);

        let reloaded = manager_with(&store);
        assert_single_active(&reloaded);
        assert_eq!(names(reloaded.tabsets()), vec!["0", "after-reset"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_captures_and_restores() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        let editor = ScriptedEditor::new();
        editor.open("file:///lib.rs", 12, 4, Some(1));
        editor.open("file:///main.rs", 3, 0, Some(2));

        let work = manager.create("work".to_string()).unwrap();
        let report = manager.activate(work.id(), &editor).await.unwrap();

        assert_eq!(report.captured, 2);
        assert_eq!(report.reopened, 0);
        assert!(report.failures.is_empty());
        assert!(editor.open_locations().is_empty());

        let active = manager.find_active().unwrap();
        assert_eq!(active.name(), "work");
        assert!(active.tabs().is_empty());

        let inactive = manager.list_inactive();
        assert_eq!(names(&inactive), vec!["0"]);
        let seed = &inactive[0];
        assert_eq!(seed.tab_count(), 2);
        assert!(!seed.is_active());

        // Switch back: the two captured tabs reopen verbatim
        let seed_id = seed.id().to_string();
        let saved_tabs = seed.tabs().to_vec();
        let report = manager.activate(&seed_id, &editor).await.unwrap();
        assert_eq!(report.reopened, 2);
        assert_eq!(editor.open_requests(), saved_tabs);
        assert_single_active(&manager);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_persists_before_reopening() {
        let store = Arc::new(MemoryStore::with_value(
            KEY,
            r#"[{"name":"0","active":true,"tabs":[]},
                {"name":"work","active":false,"tabs":[
                    {"location":"file:///a.rs","position":{"line":0,"character":0}}]}]"#,
        ));
        let mut manager = manager_with(&store);
        let editor = ScriptedEditor::new();
        editor.open("file:///scratch.rs", 1, 1, None);
        editor.observe_store(store.clone(), KEY);

        let work_id = manager.list_inactive()[0].id().to_string();
        manager.activate(&work_id, &editor).await.unwrap();

        let seen = editor.store_at_open();
        assert_eq!(seen.len(), 1);
        let persisted = decode_tabsets(&seen[0]).unwrap();
        assert!(!persisted[0].is_active());
        assert_eq!(persisted[0].tabs()[0].location(), "file:///scratch.rs");
        assert!(persisted[1].is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_without_notifications_is_bounded() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        let editor = ScriptedEditor::new();
        editor.open("file:///a.rs", 0, 0, None);
        editor.open("file:///b.rs", 0, 0, None);
        editor.silence();

        let work = manager.create("work".to_string()).unwrap();
        let start = Instant::now();
        let report = manager.activate(work.id(), &editor).await.unwrap();

        assert_eq!(report.captured, 2);
        assert_eq!(editor.close_requests(), 2);
        let timeout = manager.options().close_timeout;
        assert!(start.elapsed() < timeout * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_reports_failed_reopen() {
        let store = Arc::new(MemoryStore::with_value(
            KEY,
            r#"[{"name":"0","active":true,"tabs":[]},
                {"name":"work","active":false,"tabs":[
                    {"location":"file:///gone.rs","position":{"line":0,"character":0}},
                    {"location":"file:///kept.rs","position":{"line":9,"character":2},"layoutSlot":2}]}]"#,
        ));
        let mut manager = manager_with(&store);
        let editor = ScriptedEditor::new();
        editor.fail_open("file:///gone.rs");

        let work_id = manager.list_inactive()[0].id().to_string();
        let report = manager.activate(&work_id, &editor).await.unwrap();

        assert_eq!(report.reopened, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(editor.open_locations(), vec!["file:///kept.rs"]);
        assert_eq!(manager.find_active().unwrap().name(), "work");
    }

    #[tokio::test]
    async fn test_activate_rejects_active_and_unknown_targets() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        let editor = ScriptedEditor::new();
        editor.open("file:///a.rs", 0, 0, None);
        let active_id = manager.find_active().unwrap().id().to_string();

        let err = manager.activate(&active_id, &editor).await.unwrap_err();
        assert!(matches!(err, ManagerError::AlreadyActive(_)));
        let err = manager.activate("missing", &editor).await.unwrap_err();
        assert!(matches!(err, ManagerError::NotFound(_)));

        assert_eq!(editor.close_requests(), 0);
        assert_eq!(editor.open_locations(), vec!["file:///a.rs"]);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_follows_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(&store);
        let status = manager.subscribe_status();
        assert_eq!(status.borrow().as_deref(), Some("0"));

        let editor = ScriptedEditor::new();
        let work = manager.create("work".to_string()).unwrap();
        manager.activate(work.id(), &editor).await.unwrap();
        assert_eq!(status.borrow().as_deref(), Some("work"));
    }
}
