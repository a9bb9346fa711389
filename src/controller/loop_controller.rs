//! LoopController implementation
//!
//! One slot per recognition kind, each `Stopped` or `Running`. Start spawns a
//! tokio task; stop clears its flag and waits a bounded grace period before
//! abandoning the task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::commands::{CommandRegistry, normalize_command_name};
use crate::history::{EntrySource, HistoryEntry, Outcome, SharedHistory};
use crate::recognition::{RecognitionKind, RecognitionSource};

use super::worker::Worker;

/// Configuration for the LoopController
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Timeout handed to each source poll
    pub poll_timeout: Duration,
    /// How long stop() waits for a worker before abandoning it
    pub stop_grace: Duration,
    /// History log capacity
    pub history_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            stop_grace: Duration::from_secs(1),
            history_capacity: crate::history::DEFAULT_CAPACITY,
        }
    }
}

/// Enabled flags of both loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub voice_enabled: bool,
    pub visual_enabled: bool,
}

/// Result of a manually requested command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualOutcome {
    Executed { command: String },
    Unknown { command: String },
    Failed { command: String, message: String },
}

struct WorkerRun {
    enabled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct LoopSlot {
    kind: RecognitionKind,
    source: Arc<dyn RecognitionSource>,
    /// Mirrors `worker.is_some()`; readable without taking the lock
    enabled: AtomicBool,
    worker: Mutex<Option<WorkerRun>>,
}

impl LoopSlot {
    fn new(kind: RecognitionKind, source: Arc<dyn RecognitionSource>) -> Self {
        if source.kind() != kind {
            warn!("{} slot given a {} source", kind, source.kind());
        }
        Self {
            kind,
            source,
            enabled: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }
}

/// Coordinates the recognition loops, command registry and history log.
pub struct LoopController {
    registry: Arc<CommandRegistry>,
    history: SharedHistory,
    voice: LoopSlot,
    visual: LoopSlot,
    config: ControllerConfig,
}

impl LoopController {
    /// Create a new LoopController with the given dependencies
    pub fn new(
        registry: CommandRegistry,
        voice: Arc<dyn RecognitionSource>,
        visual: Arc<dyn RecognitionSource>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            history: SharedHistory::new(config.history_capacity),
            voice: LoopSlot::new(RecognitionKind::Voice, voice),
            visual: LoopSlot::new(RecognitionKind::Visual, visual),
            config,
        }
    }

    fn slot(&self, kind: RecognitionKind) -> &LoopSlot {
        match kind {
            RecognitionKind::Voice => &self.voice,
            RecognitionKind::Visual => &self.visual,
        }
    }

    /// Start the loop for `kind`. Returns false if it was already running.
    pub async fn start(&self, kind: RecognitionKind) -> bool {
        let slot = self.slot(kind);
        let mut worker = slot.worker.lock().await;
        if worker.is_some() {
            return false;
        }

        let enabled = Arc::new(AtomicBool::new(true));
        let task = Worker {
            kind,
            source: slot.source.clone(),
            registry: self.registry.clone(),
            history: self.history.clone(),
            enabled: enabled.clone(),
            poll_timeout: self.config.poll_timeout,
        };
        let handle = tokio::spawn(task.run());

        *worker = Some(WorkerRun { enabled, handle });
        slot.enabled.store(true, Ordering::SeqCst);
        info!("{} recognition enabled", kind);
        true
    }

    /// Stop the loop for `kind`. Returns false if it was not running.
    ///
    /// Waits up to the grace period for the worker to notice. A worker still
    /// inside a blocking poll is abandoned and may record one more entry.
    pub async fn stop(&self, kind: RecognitionKind) -> bool {
        let slot = self.slot(kind);
        let mut worker = slot.worker.lock().await;
        let Some(run) = worker.take() else {
            return false;
        };

        run.enabled.store(false, Ordering::SeqCst);
        slot.enabled.store(false, Ordering::SeqCst);

        match tokio::time::timeout(self.config.stop_grace, run.handle).await {
            Ok(Ok(())) => info!("{} recognition stopped", slot.kind),
            Ok(Err(e)) => warn!("{} worker ended abnormally: {}", slot.kind, e),
            Err(_) => warn!(
                "{} worker did not exit within {}ms, abandoning it",
                slot.kind,
                self.config.stop_grace.as_millis()
            ),
        }
        true
    }

    /// Start or stop depending on `enabled`. Returns whether anything changed.
    pub async fn set_enabled(&self, kind: RecognitionKind, enabled: bool) -> bool {
        if enabled { self.start(kind).await } else { self.stop(kind).await }
    }

    pub fn is_enabled(&self, kind: RecognitionKind) -> bool {
        self.slot(kind).enabled.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            voice_enabled: self.is_enabled(RecognitionKind::Voice),
            visual_enabled: self.is_enabled(RecognitionKind::Visual),
        }
    }

    /// Run a command on request and record it as a manual entry.
    pub async fn execute_manual(&self, raw: &str) -> ManualOutcome {
        let command = normalize_command_name(raw);
        let (entry, outcome) = match self.registry.execute(&command).await {
            Ok(true) => (
                HistoryEntry::new(EntrySource::Manual, &command, Outcome::Success),
                ManualOutcome::Executed { command },
            ),
            Ok(false) => (
                HistoryEntry::new(EntrySource::Manual, &command, Outcome::UnknownCommand),
                ManualOutcome::Unknown { command },
            ),
            Err(e) => {
                warn!("Manual command '{}' failed: {}", command, e);
                let message = e.to_string();
                (
                    HistoryEntry::error(EntrySource::Manual, &command, &message),
                    ManualOutcome::Failed { command, message },
                )
            }
        };
        self.history.record(entry).await;
        outcome
    }

    /// Most recent `limit` history entries, oldest first.
    pub async fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.history.tail(limit).await
    }

    pub fn available_commands(&self) -> Vec<String> {
        self.registry.list_names()
    }

    /// Stop both loops.
    pub async fn shutdown(&self) {
        self.stop(RecognitionKind::Voice).await;
        self.stop(RecognitionKind::Visual).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandAction;
    use crate::error::Result;
    use crate::recognition::{ScriptStep, ScriptedSource};
    use async_trait::async_trait;

    struct Quiet;

    #[async_trait]
    impl CommandAction for Quiet {
        async fn run(&self) -> Result<()> {
            Ok(())
        }
    }

    fn controller() -> LoopController {
        LoopController::new(
            CommandRegistry::new().with_command("mute", Quiet),
            Arc::new(ScriptedSource::new(RecognitionKind::Voice, vec![])),
            Arc::new(ScriptedSource::new(RecognitionKind::Visual, vec![])),
            ControllerConfig {
                poll_timeout: Duration::from_millis(10),
                stop_grace: Duration::from_millis(500),
                history_capacity: 10,
            },
        )
    }

    #[tokio::test]
    async fn test_initially_stopped() {
        let c = controller();
        assert_eq!(
            c.status(),
            ControllerStatus {
                voice_enabled: false,
                visual_enabled: false
            }
        );
    }

    #[tokio::test]
    async fn test_start_stop_idempotent() {
        let c = controller();
        assert!(c.start(RecognitionKind::Voice).await);
        assert!(!c.start(RecognitionKind::Voice).await);
        assert!(c.is_enabled(RecognitionKind::Voice));
        assert!(!c.is_enabled(RecognitionKind::Visual));

        assert!(c.stop(RecognitionKind::Voice).await);
        assert!(!c.stop(RecognitionKind::Voice).await);
        assert!(!c.is_enabled(RecognitionKind::Voice));
    }

    #[tokio::test]
    async fn test_second_start_spawns_no_worker() {
        let voice = Arc::new(ScriptedSource::new(RecognitionKind::Voice, vec![]));
        let c = LoopController::new(
            CommandRegistry::new(),
            voice.clone(),
            Arc::new(ScriptedSource::new(RecognitionKind::Visual, vec![])),
            ControllerConfig::default(),
        );
        assert!(c.start(RecognitionKind::Voice).await);
        assert!(!c.start(RecognitionKind::Voice).await);
        assert!(!c.set_enabled(RecognitionKind::Voice, true).await);

        for _ in 0..100 {
            if voice.prepares() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(voice.prepares(), 1);
        c.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let c = controller();
        assert!(!c.stop(RecognitionKind::Visual).await);
        assert!(!c.is_enabled(RecognitionKind::Visual));
    }

    #[tokio::test]
    async fn test_set_enabled() {
        let c = controller();
        assert!(c.set_enabled(RecognitionKind::Visual, true).await);
        assert!(c.status().visual_enabled);
        assert!(!c.set_enabled(RecognitionKind::Visual, true).await);
        assert!(c.set_enabled(RecognitionKind::Visual, false).await);
        assert!(!c.status().visual_enabled);
    }

    #[tokio::test]
    async fn test_execute_manual_records_history() {
        let c = controller();
        assert_eq!(
            c.execute_manual("  MUTE ").await,
            ManualOutcome::Executed {
                command: "mute".into()
            }
        );
        assert_eq!(
            c.execute_manual("unmute").await,
            ManualOutcome::Unknown {
                command: "unmute".into()
            }
        );

        let history = c.history(50).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].source, EntrySource::Manual);
        assert_eq!(history[0].outcome, Outcome::Success);
        assert_eq!(history[1].outcome, Outcome::UnknownCommand);
    }

    #[tokio::test]
    async fn test_scripted_voice_phrase_dispatched() {
        let c = LoopController::new(
            CommandRegistry::new().with_command("mute", Quiet),
            Arc::new(ScriptedSource::new(
                RecognitionKind::Voice,
                vec![ScriptStep::phrase("mute"), ScriptStep::phrase("unmute")],
            )),
            Arc::new(ScriptedSource::new(RecognitionKind::Visual, vec![])),
            ControllerConfig::default(),
        );
        c.start(RecognitionKind::Voice).await;
        for _ in 0..200 {
            if c.history(10).await.len() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        c.shutdown().await;

        let history = c.history(10).await;
        assert_eq!(history[0].payload, "mute");
        assert_eq!(history[0].outcome, Outcome::Success);
        assert_eq!(history[1].payload, "unmute");
        assert_eq!(history[1].outcome, Outcome::UnknownCommand);
    }

    #[tokio::test]
    async fn test_available_commands() {
        let c = controller();
        assert_eq!(c.available_commands(), vec!["mute"]);
    }
}
