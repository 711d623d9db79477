//! Workspace: the single owner of tabset state for one editor window
//!
//! Commands lock the manager for their whole run, prompts included, so two
//! commands can never interleave their read-modify-write of the list.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use tabsets_manager::{EditorSurface, ManagerOptions, TabManager};
use tabsets_storage::{Database, KeyValueStore};
use tabsets_tabs::TabSet;

use crate::config::Config;
use crate::prompt::Prompter;
use crate::status::{drive_status, StatusDisplay};
use crate::Result;

pub struct Workspace {
    pub(crate) manager: Mutex<TabManager>,
    pub(crate) editor: Arc<dyn EditorSurface>,
    pub(crate) prompter: Arc<dyn Prompter>,
    status: watch::Receiver<Option<String>>,
}

impl Workspace {
    /// Open the SQLite store named by `config` and load its tabsets.
    pub async fn open(
        config: &Config,
        editor: Arc<dyn EditorSurface>,
        prompter: Arc<dyn Prompter>,
    ) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let workspace =
            Self::with_store(Arc::new(db), config.manager_options(), editor, prompter).await?;

        tracing::info!(database = %config.database_path.display(), "Workspace opened");

        Ok(workspace)
    }

    pub async fn with_store(
        store: Arc<dyn KeyValueStore>,
        options: ManagerOptions,
        editor: Arc<dyn EditorSurface>,
        prompter: Arc<dyn Prompter>,
    ) -> Result<Self> {
        let manager = TabManager::load(store, options)?;
        let status = manager.subscribe_status();

        if let Some(recovery) = manager.recovery() {
            prompter
                .warn(&format!(
                    "Saved tabsets could not be read ({}). A copy was kept under '{}'.",
                    recovery.error, recovery.backup_key
                ))
                .await;
        }

        Ok(Self {
            manager: Mutex::new(manager),
            editor,
            prompter,
            status,
        })
    }

    /// Keep `display` in sync with the active tabset.
    pub fn spawn_status(&self, display: Arc<dyn StatusDisplay>) -> JoinHandle<()> {
        tokio::spawn(drive_status(self.status.clone(), display))
    }

    /// Name of the active tabset; `ManagerError::NoActiveTabSet` when the
    /// single-active invariant is broken.
    pub async fn active_name(&self) -> Result<String> {
        let manager = self.manager.lock().await;
        let active = manager.find_active()?;
        Ok(active.name().to_string())
    }

    pub async fn tabsets(&self) -> Vec<TabSet> {
        self.manager.lock().await.tabsets().to_vec()
    }
}
