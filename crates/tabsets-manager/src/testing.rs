//! In-process editor surface for tests.
//!
//! Documents are kept in visible order; opening one focuses it and closing
//! the focused one moves focus to the last remaining document. Closes can be
//! made to land after a latency, optionally announcing a transient `None`
//! focus before the next document takes focus.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::adapter::{AdapterError, DocumentHandle, EditorSurface};
use tabsets_storage::KeyValueStore;
use tabsets_tabs::{DocumentState, Position, Tab};

#[derive(Default)]
struct EditorState {
    documents: Vec<(DocumentHandle, DocumentState)>,
    focused: Option<usize>,
    next_handle: u64,
    refuse_close: HashSet<String>,
    fail_open: HashSet<String>,
    silent: bool,
    close_latency: Option<Duration>,
    transient_none: bool,
    open_requests: Vec<Tab>,
    close_requests: usize,
    store_at_open: Vec<String>,
}

struct Shared {
    state: Mutex<EditorState>,
    events: broadcast::Sender<Option<DocumentHandle>>,
}

impl Shared {
    fn focused_handle(&self) -> Option<DocumentHandle> {
        let state = self.state.lock();
        state.focused.map(|i| state.documents[i].0.clone())
    }

    fn notify(&self, focused: Option<DocumentHandle>) {
        if self.state.lock().silent {
            return;
        }
        // No subscribers is fine
        let _ = self.events.send(focused);
    }

    /// Remove `handle` and move focus to the last remaining document.
    fn finish_close(&self, handle: &DocumentHandle) {
        let mut state = self.state.lock();
        state.documents.retain(|(h, _)| h != handle);
        state.focused = state.documents.len().checked_sub(1);
    }

    async fn finish_close_announcing_none(&self, handle: &DocumentHandle) {
        {
            let mut state = self.state.lock();
            state.documents.retain(|(h, _)| h != handle);
            state.focused = None;
        }
        self.notify(None);

        tokio::time::sleep(Duration::from_millis(1)).await;

        {
            let mut state = self.state.lock();
            state.focused = state.documents.len().checked_sub(1);
        }
        self.notify(self.focused_handle());
    }
}

pub struct ScriptedEditor {
    shared: Arc<Shared>,
    observed_store: Mutex<Option<(Arc<dyn KeyValueStore>, String)>>,
}

impl Default for ScriptedEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEditor {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EditorState::default()),
                events,
            }),
            observed_store: Mutex::new(None),
        }
    }

    /// Put a document on screen and focus it.
    pub fn open(&self, location: &str, line: u32, character: u32, layout_slot: Option<u32>) {
        let mut state = self.shared.state.lock();
        state.next_handle += 1;
        let handle = DocumentHandle(format!("doc-{}", state.next_handle));
        state.documents.push((
            handle,
            DocumentState {
                location: location.to_string(),
                position: Position::new(line, character),
                layout_slot: layout_slot.and_then(NonZeroU32::new),
            },
        ));
        state.focused = Some(state.documents.len() - 1);
    }

    /// Closing this location is accepted but never happens.
    pub fn refuse_close(&self, location: &str) {
        self.shared
            .state
            .lock()
            .refuse_close
            .insert(location.to_string());
    }

    /// Opening this location fails, as for a deleted file.
    pub fn fail_open(&self, location: &str) {
        self.shared
            .state
            .lock()
            .fail_open
            .insert(location.to_string());
    }

    /// Stop emitting focus-change notifications.
    pub fn silence(&self) {
        self.shared.state.lock().silent = true;
    }

    /// Accepted closes take effect `latency` later, on a spawned task.
    pub fn close_after(&self, latency: Duration) {
        self.shared.state.lock().close_latency = Some(latency);
    }

    /// Each close first reports no focused document, then the next one.
    pub fn announce_none_on_close(&self) {
        self.shared.state.lock().transient_none = true;
    }

    /// Record the value of `key` in `store` each time a document is opened.
    pub fn observe_store(&self, store: Arc<dyn KeyValueStore>, key: &str) {
        *self.observed_store.lock() = Some((store, key.to_string()));
    }

    pub fn open_locations(&self) -> Vec<String> {
        self.shared
            .state
            .lock()
            .documents
            .iter()
            .map(|(_, doc)| doc.location.clone())
            .collect()
    }

    pub fn open_requests(&self) -> Vec<Tab> {
        self.shared.state.lock().open_requests.clone()
    }

    pub fn close_requests(&self) -> usize {
        self.shared.state.lock().close_requests
    }

    pub fn store_at_open(&self) -> Vec<String> {
        self.shared.state.lock().store_at_open.clone()
    }
}

#[async_trait]
impl EditorSurface for ScriptedEditor {
    fn open_documents(&self) -> Vec<DocumentHandle> {
        self.shared
            .state
            .lock()
            .documents
            .iter()
            .map(|(handle, _)| handle.clone())
            .collect()
    }

    fn active_document(&self) -> Option<DocumentHandle> {
        self.shared.focused_handle()
    }

    fn capture_state(&self, handle: &DocumentHandle) -> DocumentState {
        self.shared
            .state
            .lock()
            .documents
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, doc)| doc.clone())
            .unwrap_or_else(|| DocumentState {
                location: handle.0.clone(),
                position: Position::default(),
                layout_slot: None,
            })
    }

    async fn close_active_document(&self) -> Result<(), AdapterError> {
        let (handle, latency, transient_none) = {
            let mut state = self.shared.state.lock();
            state.close_requests += 1;

            let Some(index) = state.focused else {
                return Ok(());
            };
            let (handle, document) = &state.documents[index];
            if state.refuse_close.contains(&document.location) {
                return Ok(());
            }
            (handle.clone(), state.close_latency, state.transient_none)
        };

        let shared = Arc::clone(&self.shared);
        let finish = async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            if transient_none {
                shared.finish_close_announcing_none(&handle).await;
            } else {
                shared.finish_close(&handle);
                shared.notify(shared.focused_handle());
            }
        };

        if latency.is_some() || transient_none {
            tokio::spawn(finish);
        } else {
            finish.await;
        }
        Ok(())
    }

    fn subscribe_active_changes(&self) -> broadcast::Receiver<Option<DocumentHandle>> {
        self.shared.events.subscribe()
    }

    async fn open_document(&self, tab: &Tab) -> Result<(), AdapterError> {
        if let Some((store, key)) = self.observed_store.lock().as_ref() {
            if let Ok(value) = store.get(key, "") {
                self.shared.state.lock().store_at_open.push(value);
            }
        }

        self.shared.state.lock().open_requests.push(tab.clone());

        if self.shared.state.lock().fail_open.contains(tab.location()) {
            return Err(AdapterError::OpenFailed {
                location: tab.location().to_string(),
                reason: "file not found".to_string(),
            });
        }

        let position = tab.position();
        self.open(
            tab.location(),
            position.line,
            position.character,
            tab.layout_slot().map(NonZeroU32::get),
        );
        self.shared.notify(self.shared.focused_handle());
        Ok(())
    }
}
