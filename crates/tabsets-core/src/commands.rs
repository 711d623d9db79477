//! Commands bound by the host UI
//!
//! Each command prompts first and mutates last: a dismissed prompt returns
//! `CommandOutcome::Cancelled` before anything is written.

use std::collections::HashSet;

use tabsets_manager::{ActivationReport, ManagerError};
use tabsets_tabs::TabSet;

use crate::prompt::PickItem;
use crate::workspace::Workspace;
use crate::Result;

type CommandResult = std::result::Result<CommandOutcome, ManagerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Switch,
    New,
    Delete,
    Rename,
    Reset,
}

impl CommandId {
    pub const ALL: [CommandId; 5] = [
        CommandId::Switch,
        CommandId::New,
        CommandId::Delete,
        CommandId::Rename,
        CommandId::Reset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandId::Switch => "tabsets.switch",
            CommandId::New => "tabsets.new",
            CommandId::Delete => "tabsets.delete",
            CommandId::Rename => "tabsets.rename",
            CommandId::Reset => "tabsets.reset",
        }
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CommandId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CommandId::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown command: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    /// The user dismissed a prompt; nothing changed
    Cancelled,
    /// The request was refused; nothing changed
    Rejected(String),
    /// Tabset state is inconsistent and needs a reset
    Failed(String),
}

/// Smallest non-negative integer not already used as a tabset name.
pub(crate) fn next_default_name(tabsets: &[TabSet]) -> String {
    let used: HashSet<&str> = tabsets.iter().map(|s| s.name()).collect();
    (0u64..)
        .map(|n| n.to_string())
        .find(|name| !used.contains(name.as_str()))
        .unwrap_or_default()
}

impl Workspace {
    /// Run a command, turning refusals into user-visible errors.
    ///
    /// Only environment failures such as an unwritable store come back as
    /// `Err`.
    pub async fn execute(&self, command: CommandId) -> Result<CommandOutcome> {
        tracing::debug!(%command, "Running command");

        let result = match command {
            CommandId::Switch => self.switch().await,
            CommandId::New => self.new_tabset().await,
            CommandId::Delete => self.delete().await,
            CommandId::Rename => self.rename().await,
            CommandId::Reset => self.reset().await,
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_invariant_violation() => {
                tracing::error!(%command, error = %e, "Tabset state is inconsistent");
                let message = e.to_string();
                self.prompter.error(&message).await;
                Ok(CommandOutcome::Failed(message))
            }
            Err(e) if e.is_invalid_operation() => {
                tracing::warn!(%command, error = %e, "Command refused");
                let message = e.to_string();
                self.prompter.error(&message).await;
                Ok(CommandOutcome::Rejected(message))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn switch(&self) -> CommandResult {
        let mut manager = self.manager.lock().await;
        manager.find_active()?;

        let candidates = manager.list_inactive();
        if candidates.is_empty() {
            self.prompter
                .warn("There are no other tabsets to switch to.")
                .await;
            return Ok(CommandOutcome::Cancelled);
        }

        let items: Vec<PickItem> = candidates.iter().map(PickItem::from_tabset).collect();
        let Some(choice) = self.prompter.pick_one("Switch to tabset", &items).await else {
            return Ok(CommandOutcome::Cancelled);
        };
        let Some(target) = candidates.get(choice) else {
            return Ok(CommandOutcome::Cancelled);
        };

        let report = manager.activate(target.id(), self.editor.as_ref()).await?;
        self.show_report(&report).await;

        Ok(CommandOutcome::Completed)
    }

    async fn new_tabset(&self) -> CommandResult {
        let mut manager = self.manager.lock().await;
        manager.find_active()?;

        let default = next_default_name(manager.tabsets());
        let Some(name) = self.prompter.input("Name of the new tabset", &default).await else {
            return Ok(CommandOutcome::Cancelled);
        };

        let tabset = manager.create(name)?;
        let report = manager.activate(tabset.id(), self.editor.as_ref()).await?;
        self.show_report(&report).await;

        Ok(CommandOutcome::Completed)
    }

    async fn delete(&self) -> CommandResult {
        let mut manager = self.manager.lock().await;
        manager.find_active()?;

        let candidates = manager.list_inactive();
        if candidates.is_empty() {
            self.prompter
                .warn("There are no inactive tabsets to delete.")
                .await;
            return Ok(CommandOutcome::Cancelled);
        }

        let items: Vec<PickItem> = candidates.iter().map(PickItem::from_tabset).collect();
        let Some(choices) = self.prompter.pick_many("Delete tabsets", &items).await else {
            return Ok(CommandOutcome::Cancelled);
        };

        let selected: Vec<&TabSet> = choices
            .iter()
            .filter_map(|&i| candidates.get(i))
            .collect();
        if selected.is_empty() {
            return Ok(CommandOutcome::Cancelled);
        }

        let names: Vec<&str> = selected.iter().map(|s| s.name()).collect();
        let question = format!("Delete {}? Their saved tabs will be lost.", names.join(", "));
        if !self.prompter.confirm(&question).await {
            return Ok(CommandOutcome::Cancelled);
        }

        let ids: Vec<String> = selected.iter().map(|s| s.id().to_string()).collect();
        manager.delete(&ids)?;

        Ok(CommandOutcome::Completed)
    }

    async fn rename(&self) -> CommandResult {
        let mut manager = self.manager.lock().await;
        manager.find_active()?;

        let candidates = manager.tabsets().to_vec();
        let items: Vec<PickItem> = candidates.iter().map(PickItem::from_tabset).collect();
        let Some(choice) = self.prompter.pick_one("Rename tabset", &items).await else {
            return Ok(CommandOutcome::Cancelled);
        };
        let Some(target) = candidates.get(choice) else {
            return Ok(CommandOutcome::Cancelled);
        };

        let Some(name) = self.prompter.input("New name", target.name()).await else {
            return Ok(CommandOutcome::Cancelled);
        };
        if name == target.name() {
            return Ok(CommandOutcome::Cancelled);
        }

        manager.rename(target.id(), name)?;

        Ok(CommandOutcome::Completed)
    }

    async fn reset(&self) -> CommandResult {
        let mut manager = self.manager.lock().await;

        if !self
            .prompter
            .confirm("Reset all tabsets? Every saved tabset will be lost.")
            .await
        {
            return Ok(CommandOutcome::Cancelled);
        }

        manager.reset()?;

        Ok(CommandOutcome::Completed)
    }

    async fn show_report(&self, report: &ActivationReport) {
        for failure in &report.failures {
            self.prompter.warn(&failure.to_string()).await;
        }
        if report.left_open > 0 {
            self.prompter
                .warn(&format!(
                    "{} document(s) could not be closed and were left open.",
                    report.left_open
                ))
                .await;
        }
    }
}
