//! Recognition sources
//!
//! A recognition source is anything the controller can poll for events:
//! - voice: blocks on audio capture and yields a recognized phrase
//! - visual: captures the screen and yields a detection
//!
//! The speech engine, screen grabber and detector behind them are external
//! collaborators reached through the traits in `voice` and `visual`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

mod process;
pub mod scripted;
pub mod visual;
pub mod voice;

pub use scripted::{ScriptStep, ScriptedSource};
pub use visual::{CommandCapture, Detector, Frame, ScreenCapture, SkinToneDetector, VisualSource};
pub use voice::{ListenOutcome, ProcessRecognizer, SpeechRecognizer, VoiceSource};

/// Tag logged for a visual detection.
pub const GESTURE_TAG: &str = "gesture";

/// The two independently toggleable loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionKind {
    Voice,
    Visual,
}

impl RecognitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Visual => "visual",
        }
    }
}

impl fmt::Display for RecognitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something a source produced during one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Lowercased recognized phrase, to be dispatched as a command
    Phrase(String),
    /// Detector hit, logged directly under the given tag
    Detection(String),
}

/// A pollable input for a recognition loop.
#[async_trait]
pub trait RecognitionSource: Send + Sync {
    fn kind(&self) -> RecognitionKind;

    /// One-time setup before the first poll.
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Wait up to `timeout` for an event. `Ok(None)` means nothing this cycle.
    async fn next_event(&self, timeout: Duration) -> Result<Option<RecognitionEvent>>;

    /// Pause between polls, for sources that don't block on their own.
    fn pace(&self) -> Option<Duration> {
        None
    }
}
