//! User interaction surface
//!
//! Every prompt returns `None` (or `false`) when the user dismisses it;
//! commands treat that as cancellation.

use async_trait::async_trait;

use tabsets_tabs::TabSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub detail: String,
}

impl PickItem {
    pub fn from_tabset(tabset: &TabSet) -> Self {
        let detail = match tabset.tab_count() {
            1 => "1 tab".to_string(),
            n => format!("{n} tabs"),
        };

        Self {
            label: tabset.name().to_string(),
            detail,
        }
    }
}

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Single-choice picker; returns the chosen index.
    async fn pick_one(&self, title: &str, items: &[PickItem]) -> Option<usize>;

    /// Multi-choice picker; returns the chosen indices.
    async fn pick_many(&self, title: &str, items: &[PickItem]) -> Option<Vec<usize>>;

    /// Free-text input pre-filled with `default`.
    async fn input(&self, prompt: &str, default: &str) -> Option<String>;

    async fn confirm(&self, message: &str) -> bool;

    async fn warn(&self, message: &str);

    async fn error(&self, message: &str);
}
