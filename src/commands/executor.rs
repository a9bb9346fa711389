//! OS action execution
//!
//! Defines the ActionExecutor trait and ProcessExecutor, which runs each
//! action as a child process.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::clock;
use crate::error::{HandsfreeError, Result};

/// Placeholder replaced with a fresh screenshot file name at run time.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// A process to launch for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Launch and return immediately instead of waiting for exit
    pub detach: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            detach: false,
        }
    }

    /// Mark this invocation as fire-and-forget.
    pub fn detached(mut self) -> Self {
        self.detach = true;
        self
    }

    /// Build from an argv list; `None` when the list is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    /// Args with `{file}` substituted.
    pub fn rendered_args(&self) -> Vec<String> {
        if !self.args.iter().any(|a| a.contains(FILE_PLACEHOLDER)) {
            return self.args.clone();
        }
        let file = clock::screenshot_file_name();
        self.args.iter().map(|a| a.replace(FILE_PLACEHOLDER, &file)).collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Carries out OS-level actions.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<()>;
}

/// Runs invocations as child processes.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl ActionExecutor for ProcessExecutor {
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        let mut command = Command::new(&invocation.program);
        command.args(invocation.rendered_args()).stdin(Stdio::null()).stdout(Stdio::null());

        if invocation.detach {
            command
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| HandsfreeError::Action(format!("Failed to launch {}: {}", invocation.program, e)))?;
            log::debug!("Launched detached: {}", invocation);
            return Ok(());
        }

        let child = command
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HandsfreeError::Action(format!("Failed to spawn {}: {}", invocation.program, e)))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(HandsfreeError::Action(format!(
                    "{} timed out after {}ms",
                    invocation.program,
                    self.timeout.as_millis()
                )));
            }
        };

        if output.status.success() {
            log::debug!("Ran: {}", invocation);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(HandsfreeError::Action(format!(
                "{} exited with {}: {}",
                invocation.program,
                output.status,
                stderr.trim()
            )))
        }
    }
}
