//! Capture-and-close and reopen halves of a tabset switch.
//!
//! Editors accept a close request immediately and finish it later, so each
//! close waits for whichever arrives first: a focus-change notification or
//! a deadline.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::adapter::{AdapterError, DocumentHandle, EditorSurface};
use tabsets_tabs::Tab;

/// How a single close wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseSignal {
    /// The editor reported a focus change
    Changed,
    /// Nothing arrived before the deadline
    TimedOut,
}

/// Outcome of `TabManager::activate`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    /// Tabs captured into the outgoing tabset
    pub captured: usize,
    /// Tabs of the incoming tabset that opened
    pub reopened: usize,
    /// Tabs that failed to open, one error each
    pub failures: Vec<AdapterError>,
    /// Documents that refused to close and are still open
    pub left_open: usize,
}

/// Wait for the next focus change or `timeout`, whichever comes first.
///
/// A closed channel never resolves the event side, so the deadline still
/// bounds the wait.
pub async fn wait_for_close(
    events: &mut broadcast::Receiver<Option<DocumentHandle>>,
    timeout: Duration,
) -> CloseSignal {
    let changed = async {
        match events.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = changed => CloseSignal::Changed,
        _ = tokio::time::sleep(timeout) => CloseSignal::TimedOut,
    }
}

/// Close every open document, capturing each focused one on the way.
///
/// At most one close request is outstanding: while the editor has not acted
/// on the last request the loop only waits. If `stall_limit` waits pass with
/// no change, every open document not yet captured is captured as well and
/// no further close is requested, so nothing that might still close later is
/// missing from the snapshot.
///
/// Returns the snapshot in close order and the number of documents still
/// open when capture stopped.
pub(crate) async fn capture_and_close(
    editor: &dyn EditorSurface,
    timeout: Duration,
    stall_limit: u32,
) -> (Vec<Tab>, usize) {
    let mut snapshot = Vec::new();
    let mut captured: HashSet<DocumentHandle> = HashSet::new();
    let mut requested: Option<(Option<DocumentHandle>, usize)> = None;
    let mut stalls = 0u32;

    loop {
        let focused = editor.active_document();
        let open = editor.open_documents();

        if focused.is_none() && open.is_empty() {
            return (snapshot, 0);
        }

        let state = (focused, open.len());

        // Subscribe before requesting the close so its notification can't be missed
        let mut events = editor.subscribe_active_changes();

        if requested.as_ref() == Some(&state) {
            stalls += 1;
            if stalls >= stall_limit {
                for handle in &open {
                    capture_once(editor, handle, &mut captured, &mut snapshot);
                }
                tracing::warn!(
                    remaining = open.len(),
                    document = ?state.0,
                    "Editor stopped closing documents; leaving them open"
                );
                return (snapshot, open.len());
            }
        } else {
            stalls = 0;
            if let Some(handle) = &state.0 {
                capture_once(editor, handle, &mut captured, &mut snapshot);
            }
            if let Err(e) = editor.close_active_document().await {
                tracing::debug!(error = %e, "Close request rejected; waiting out the deadline");
            }
            requested = Some(state);
        }

        let signal = wait_for_close(&mut events, timeout).await;
        drop(events);
        tracing::trace!(?signal, stalls, "Close wait finished");
    }
}

fn capture_once(
    editor: &dyn EditorSurface,
    handle: &DocumentHandle,
    captured: &mut HashSet<DocumentHandle>,
    snapshot: &mut Vec<Tab>,
) {
    if captured.insert(handle.clone()) {
        let tab = Tab::capture(&editor.capture_state(handle));
        tracing::debug!(location = %tab.location(), "Captured tab");
        snapshot.push(tab);
    }
}

/// Open each tab in order. A failure never stops the remaining tabs.
pub(crate) async fn reopen(
    editor: &dyn EditorSurface,
    tabs: &[Tab],
) -> (usize, Vec<AdapterError>) {
    let mut opened = 0;
    let mut failures = Vec::new();

    for tab in tabs {
        match editor.open_document(tab).await {
            Ok(()) => opened += 1,
            Err(e) => {
                tracing::warn!(location = %tab.location(), error = %e, "Failed to reopen tab");
                failures.push(e);
            }
        }
    }

    (opened, failures)
}
