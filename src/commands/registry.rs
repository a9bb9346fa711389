//! Command registry
//!
//! Static mapping from a lowercased command name to an action. Built once at
//! startup; the names are the only externally visible surface.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

use super::actions::DesktopCommand;
use super::executor::ActionExecutor;

/// A zero-argument, side-effecting action.
#[async_trait]
pub trait CommandAction: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Normalize raw user or recognizer text into a registry key.
///
/// Trims, lowercases and collapses runs of whitespace.
pub fn normalize_command_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered table of named actions.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    entries: Vec<(String, Arc<dyn CommandAction>)>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in desktop action.
    pub fn desktop(executor: Arc<dyn ActionExecutor>, overrides: &HashMap<String, Vec<String>>) -> Self {
        DesktopCommand::builtins(executor, overrides)
            .into_iter()
            .fold(Self::new(), |registry, command| {
                let name = command.action().name();
                registry.with_command(name, command)
            })
    }

    /// Add a command during construction. Re-registering a name replaces the
    /// action but keeps its original position.
    pub fn with_command(mut self, name: &str, action: impl CommandAction + 'static) -> Self {
        let name = normalize_command_name(name);
        let action: Arc<dyn CommandAction> = Arc::new(action);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = action,
            None => self.entries.push((name, action)),
        }
        self
    }

    /// Run the action registered under `name`.
    ///
    /// Returns `Ok(false)` without side effects when the name is unknown.
    /// A failing action surfaces as `Err`.
    pub async fn execute(&self, name: &str) -> Result<bool> {
        let Some(action) = self.get(name) else {
            return Ok(false);
        };
        action.run().await?;
        Ok(true)
    }

    /// Registered names in registration order.
    pub fn list_names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, name: &str) -> Option<Arc<dyn CommandAction>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a.clone())
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry").field("names", &self.list_names()).finish()
    }
}
