//! Voice recognition source.
//!
//! Wraps a speech recognizer: one ambient-noise calibration, then repeated
//! bounded listens. Timeouts, unintelligible speech and recognizer failures
//! all come back as "no phrase"; the cause is only logged.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{HandsfreeError, Result};

use super::process::{ProcessRun, render_timeout, run_captured};
use super::{RecognitionEvent, RecognitionKind, RecognitionSource};

/// What a single listen produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    /// Recognized transcript
    Phrase(String),
    /// No speech before the timeout
    Timeout,
    /// Speech heard but not recognized
    Unintelligible,
}

/// Speech-to-text engine.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Sample ambient noise for at most `duration`.
    async fn calibrate(&self, duration: Duration) -> Result<()>;

    /// Listen for one utterance. `Err` means the engine itself failed.
    async fn listen(&self, timeout: Duration) -> Result<ListenOutcome>;
}

/// Speech recognizer backed by external commands.
///
/// The listen command prints the transcript on stdout. `{timeout_ms}` and
/// `{timeout_secs}` in its arguments are replaced with the listen timeout.
#[derive(Debug, Clone)]
pub struct ProcessRecognizer {
    listen_command: Vec<String>,
    calibrate_command: Option<Vec<String>>,
    /// Extra time allowed for transcription after the listen window
    transcribe_slack: Duration,
}

impl ProcessRecognizer {
    pub fn new(listen_command: Vec<String>) -> Self {
        Self {
            listen_command,
            calibrate_command: None,
            transcribe_slack: Duration::from_secs(5),
        }
    }

    pub fn with_calibrate_command(mut self, command: Option<Vec<String>>) -> Self {
        self.calibrate_command = command.filter(|c| !c.is_empty());
        self
    }

    pub fn with_transcribe_slack(mut self, slack: Duration) -> Self {
        self.transcribe_slack = slack;
        self
    }
}

#[async_trait]
impl SpeechRecognizer for ProcessRecognizer {
    async fn calibrate(&self, duration: Duration) -> Result<()> {
        let Some(command) = &self.calibrate_command else {
            log::debug!("No calibration command configured, settling for {}ms", duration.as_millis());
            tokio::time::sleep(duration).await;
            return Ok(());
        };

        let argv = render_timeout(command, duration);
        match run_captured(&argv, duration + self.transcribe_slack)
            .await
            .map_err(|e| HandsfreeError::Recognition(format!("calibration failed to start: {}", e)))?
        {
            ProcessRun::Finished(output) if output.status.success() => Ok(()),
            ProcessRun::Finished(output) => Err(HandsfreeError::Recognition(format!(
                "calibration exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            ProcessRun::TimedOut => Err(HandsfreeError::Recognition("calibration timed out".into())),
        }
    }

    async fn listen(&self, timeout: Duration) -> Result<ListenOutcome> {
        let argv = render_timeout(&self.listen_command, timeout);
        let run = run_captured(&argv, timeout + self.transcribe_slack)
            .await
            .map_err(|e| HandsfreeError::Recognition(format!("listen command failed to start: {}", e)))?;

        let output = match run {
            ProcessRun::Finished(output) => output,
            ProcessRun::TimedOut => return Ok(ListenOutcome::Timeout),
        };

        if !output.status.success() {
            return Err(HandsfreeError::Recognition(format!(
                "listen command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            Ok(ListenOutcome::Unintelligible)
        } else {
            Ok(ListenOutcome::Phrase(transcript))
        }
    }
}

/// Voice recognition source over any speech recognizer.
pub struct VoiceSource<R: SpeechRecognizer> {
    recognizer: R,
    calibration: Duration,
}

impl<R: SpeechRecognizer> VoiceSource<R> {
    pub fn new(recognizer: R, calibration: Duration) -> Self {
        Self {
            recognizer,
            calibration,
        }
    }

    /// Listen once, returning the lowercased phrase if one was recognized.
    pub async fn poll(&self, timeout: Duration) -> Option<String> {
        match self.recognizer.listen(timeout).await {
            Ok(ListenOutcome::Phrase(text)) => Some(text.to_lowercase()),
            Ok(ListenOutcome::Timeout) => {
                log::debug!("Voice poll: no speech within {}ms", timeout.as_millis());
                None
            }
            Ok(ListenOutcome::Unintelligible) => {
                log::debug!("Voice poll: speech was unintelligible");
                None
            }
            Err(e) => {
                log::debug!("Voice poll: recognizer failed: {}", e);
                // A failing engine returns instantly; hold the poll to its window
                tokio::time::sleep(timeout).await;
                None
            }
        }
    }
}

#[async_trait]
impl<R: SpeechRecognizer> RecognitionSource for VoiceSource<R> {
    fn kind(&self) -> RecognitionKind {
        RecognitionKind::Voice
    }

    async fn prepare(&self) -> Result<()> {
        log::info!("Adjusting for ambient noise...");
        self.recognizer.calibrate(self.calibration).await
    }

    async fn next_event(&self, timeout: Duration) -> Result<Option<RecognitionEvent>> {
        Ok(self.poll(timeout).await.map(RecognitionEvent::Phrase))
    }
}
