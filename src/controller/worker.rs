//! Background worker for one recognition loop.
//!
//! Each iteration: poll the source, dispatch any event, record the outcome.
//! Faults are caught at the iteration boundary and recorded; only clearing
//! the enabled flag ends the loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;

use crate::commands::{CommandRegistry, normalize_command_name};
use crate::history::{EntrySource, HistoryEntry, Outcome, SharedHistory};
use crate::recognition::{RecognitionEvent, RecognitionKind, RecognitionSource};

/// Pause after a failed iteration for sources that don't pace themselves.
const ERROR_BACKOFF: Duration = Duration::from_millis(250);

/// Payload recorded when a fault has no command text attached.
const ERROR_PAYLOAD: &str = "error";

impl From<RecognitionKind> for EntrySource {
    fn from(kind: RecognitionKind) -> Self {
        match kind {
            RecognitionKind::Voice => EntrySource::Voice,
            RecognitionKind::Visual => EntrySource::Visual,
        }
    }
}

pub(crate) struct Worker {
    pub kind: RecognitionKind,
    pub source: Arc<dyn RecognitionSource>,
    pub registry: Arc<CommandRegistry>,
    pub history: SharedHistory,
    pub enabled: Arc<AtomicBool>,
    pub poll_timeout: Duration,
}

impl Worker {
    pub async fn run(self) {
        tracing::info!(kind = %self.kind, "Recognition loop starting");

        let failure = match AssertUnwindSafe(self.source.prepare()).catch_unwind().await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(panic) => Some(panic_message(panic.as_ref())),
        };
        if let Some(message) = failure {
            tracing::error!(kind = %self.kind, error = %message, "Source preparation failed");
            self.record(HistoryEntry::error(self.kind.into(), ERROR_PAYLOAD, message))
                .await;
        }

        tracing::info!(kind = %self.kind, "Recognition loop started");

        while self.enabled.load(Ordering::SeqCst) {
            let recorded = AssertUnwindSafe(self.iterate()).catch_unwind().await;
            let entry = match recorded {
                Ok(entry) => entry,
                Err(panic) => Some(HistoryEntry::error(
                    self.kind.into(),
                    ERROR_PAYLOAD,
                    panic_message(panic.as_ref()),
                )),
            };

            let failed = entry.as_ref().is_some_and(|e| e.outcome.is_error());
            if let Some(entry) = entry {
                self.record(entry).await;
            }

            match self.source.pace() {
                Some(pace) => tokio::time::sleep(pace).await,
                None if failed => tokio::time::sleep(ERROR_BACKOFF).await,
                None => {}
            }
        }

        tracing::info!(kind = %self.kind, "Recognition loop stopped");
    }

    /// One poll-dispatch cycle. Returns the entry to record, if any.
    async fn iterate(&self) -> Option<HistoryEntry> {
        let source = EntrySource::from(self.kind);
        match self.source.next_event(self.poll_timeout).await {
            Ok(Some(event)) => Some(self.dispatch(event).await),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(kind = %self.kind, error = %e, "Recognition poll failed");
                Some(HistoryEntry::error(source, ERROR_PAYLOAD, e.to_string()))
            }
        }
    }

    async fn dispatch(&self, event: RecognitionEvent) -> HistoryEntry {
        let source = EntrySource::from(self.kind);
        match event {
            RecognitionEvent::Phrase(phrase) => {
                let command = normalize_command_name(&phrase);
                tracing::info!(kind = %self.kind, command = %command, "Voice command detected");
                match self.registry.execute(&command).await {
                    Ok(true) => HistoryEntry::new(source, command, Outcome::Success),
                    Ok(false) => HistoryEntry::new(source, command, Outcome::UnknownCommand),
                    Err(e) => {
                        tracing::error!(kind = %self.kind, command = %command, error = %e, "Command failed");
                        HistoryEntry::error(source, command, e.to_string())
                    }
                }
            }
            RecognitionEvent::Detection(tag) => {
                tracing::info!(kind = %self.kind, tag = %tag, "Gesture detected");
                HistoryEntry::new(source, tag, Outcome::Detected)
            }
        }
    }

    async fn record(&self, entry: HistoryEntry) {
        self.history.record(entry).await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandAction;
    use crate::error::{HandsfreeError, Result};
    use crate::recognition::{ScriptStep, ScriptedSource};
    use async_trait::async_trait;

    struct Quiet;

    #[async_trait]
    impl CommandAction for Quiet {
        async fn run(&self) -> Result<()> {
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl CommandAction for Broken {
        async fn run(&self) -> Result<()> {
            Err(HandsfreeError::Action("xdotool missing".into()))
        }
    }

    struct Panicky;

    #[async_trait]
    impl CommandAction for Panicky {
        async fn run(&self) -> Result<()> {
            panic!("action blew up");
        }
    }

    /// Source whose setup panics, then reports a detection on every poll.
    struct PanickyPrepare;

    #[async_trait]
    impl RecognitionSource for PanickyPrepare {
        fn kind(&self) -> RecognitionKind {
            RecognitionKind::Visual
        }

        async fn prepare(&self) -> Result<()> {
            panic!("camera driver crashed");
        }

        async fn next_event(&self, _timeout: Duration) -> Result<Option<RecognitionEvent>> {
            Ok(Some(RecognitionEvent::Detection("gesture".into())))
        }

        fn pace(&self) -> Option<Duration> {
            Some(Duration::from_millis(5))
        }
    }

    fn worker(kind: RecognitionKind, steps: Vec<ScriptStep>, history: SharedHistory) -> Worker {
        let registry = CommandRegistry::new()
            .with_command("mute", Quiet)
            .with_command("volume up", Broken)
            .with_command("next window", Panicky);
        Worker {
            kind,
            source: Arc::new(ScriptedSource::new(kind, steps)),
            registry: Arc::new(registry),
            history,
            enabled: Arc::new(AtomicBool::new(true)),
            poll_timeout: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("bad");
        assert_eq!(panic_message(payload.as_ref()), "panic: bad");
        let payload: Box<dyn Any + Send> = Box::new(String::from("worse"));
        assert_eq!(panic_message(payload.as_ref()), "panic: worse");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "panic");
    }

    #[tokio::test]
    async fn test_dispatch_outcomes() {
        let history = SharedHistory::new(10);
        let w = worker(RecognitionKind::Voice, vec![], history);

        let ok = w.dispatch(RecognitionEvent::Phrase("Mute".into())).await;
        assert_eq!(ok.payload, "mute");
        assert_eq!(ok.outcome, Outcome::Success);

        let unknown = w.dispatch(RecognitionEvent::Phrase("dance".into())).await;
        assert_eq!(unknown.outcome, Outcome::UnknownCommand);

        let failed = w.dispatch(RecognitionEvent::Phrase("volume up".into())).await;
        assert!(failed.outcome.is_error());
        assert_eq!(failed.payload, "volume up");

        let detected = w.dispatch(RecognitionEvent::Detection("gesture".into())).await;
        assert_eq!(detected.outcome, Outcome::Detected);
        assert_eq!(detected.source, EntrySource::Voice);
    }

    #[tokio::test]
    async fn test_iterate_skips_empty_polls() {
        let history = SharedHistory::new(10);
        let w = worker(RecognitionKind::Visual, vec![ScriptStep::Nothing], history);
        assert!(w.iterate().await.is_none());
    }

    #[tokio::test]
    async fn test_run_survives_faults_and_panics() {
        let history = SharedHistory::new(10);
        let w = worker(
            RecognitionKind::Voice,
            vec![
                ScriptStep::phrase("volume up"),
                ScriptStep::phrase("next window"),
                ScriptStep::Fail("mic gone".into()),
                ScriptStep::phrase("mute"),
            ],
            history.clone(),
        );
        let enabled = w.enabled.clone();
        let handle = tokio::spawn(w.run());

        for _ in 0..200 {
            if history.len().await >= 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        enabled.store(false, Ordering::SeqCst);
        handle.await.unwrap();

        let entries = history.tail(10).await;
        assert_eq!(entries.len(), 4);
        assert!(entries[0].outcome.is_error());
        assert!(matches!(&entries[1].outcome, Outcome::Error(m) if m.contains("action blew up")));
        assert!(entries[2].outcome.is_error());
        assert_eq!(entries[3].outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_run_survives_panicking_prepare() {
        let history = SharedHistory::new(10);
        let mut w = worker(RecognitionKind::Visual, vec![], history.clone());
        w.source = Arc::new(PanickyPrepare);
        let enabled = w.enabled.clone();
        let handle = tokio::spawn(w.run());

        for _ in 0..200 {
            if history.len().await >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        enabled.store(false, Ordering::SeqCst);
        handle.await.unwrap();

        let entries = history.tail(10).await;
        assert!(matches!(&entries[0].outcome, Outcome::Error(m) if m.contains("camera driver crashed")));
        assert_eq!(entries[0].source, EntrySource::Visual);
        assert_eq!(entries[1].outcome, Outcome::Detected);
    }
}
