//! Scripted recognition source for tests and demos.
//!
//! Plays back a fixed list of steps, one per poll, then idles.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{HandsfreeError, Result};

use super::{RecognitionEvent, RecognitionKind, RecognitionSource};

/// One scripted poll result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Event(RecognitionEvent),
    Nothing,
    Fail(String),
}

impl ScriptStep {
    pub fn phrase(text: &str) -> Self {
        Self::Event(RecognitionEvent::Phrase(text.to_string()))
    }

    pub fn detection(tag: &str) -> Self {
        Self::Event(RecognitionEvent::Detection(tag.to_string()))
    }
}

/// Source that replays a script.
pub struct ScriptedSource {
    kind: RecognitionKind,
    steps: Mutex<VecDeque<ScriptStep>>,
    pace: Duration,
    prepare_error: Option<String>,
    polls: AtomicUsize,
    prepares: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(kind: RecognitionKind, steps: Vec<ScriptStep>) -> Self {
        Self {
            kind,
            steps: Mutex::new(steps.into()),
            pace: Duration::from_millis(5),
            prepare_error: None,
            polls: AtomicUsize::new(0),
            prepares: AtomicUsize::new(0),
        }
    }

    /// Delay between polls.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Make `prepare()` fail with the given message.
    pub fn failing_prepare(mut self, message: &str) -> Self {
        self.prepare_error = Some(message.to_string());
        self
    }

    /// Number of polls served so far.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn prepares(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }

    /// Steps not yet played.
    pub fn remaining(&self) -> usize {
        self.steps.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecognitionSource for ScriptedSource {
    fn kind(&self) -> RecognitionKind {
        self.kind
    }

    async fn prepare(&self) -> Result<()> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        match &self.prepare_error {
            Some(message) => Err(HandsfreeError::Recognition(message.clone())),
            None => Ok(()),
        }
    }

    async fn next_event(&self, _timeout: Duration) -> Result<Option<RecognitionEvent>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .map_err(|_| HandsfreeError::InvalidState("script lock poisoned".into()))?
            .pop_front();

        match step {
            Some(ScriptStep::Event(event)) => Ok(Some(event)),
            Some(ScriptStep::Fail(message)) => Err(HandsfreeError::Recognition(message)),
            Some(ScriptStep::Nothing) | None => Ok(None),
        }
    }

    fn pace(&self) -> Option<Duration> {
        Some(self.pace)
    }
}
