//! History entry types.

use serde::{Deserialize, Serialize};

use crate::clock;

/// Where a dispatch attempt originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Voice,
    Visual,
    Manual,
}

impl EntrySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Visual => "visual",
            Self::Manual => "manual",
        }
    }
}

/// Result of a single dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "kebab-case")]
pub enum Outcome {
    /// Command was known and its action ran to completion
    Success,
    /// Command name was not in the registry
    UnknownCommand,
    /// Visual detector reported a hit
    Detected,
    /// Something failed during the iteration
    Error(String),
}

impl Outcome {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::UnknownCommand => "unknown command",
            Self::Detected => "detected",
            Self::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// One immutable record in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Local wall-clock time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub source: EntrySource,
    /// Command text or event tag
    pub payload: String,
    pub outcome: Outcome,
    /// Append order within the log, assigned by `HistoryLog::append`
    #[serde(default)]
    pub seq: u64,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(source: EntrySource, payload: impl Into<String>, outcome: Outcome) -> Self {
        Self::with_timestamp(clock::timestamp(), source, payload, outcome)
    }

    /// Create an entry with an explicit timestamp.
    pub fn with_timestamp(
        timestamp: impl Into<String>,
        source: EntrySource,
        payload: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            source,
            payload: payload.into(),
            outcome,
            seq: 0,
        }
    }

    /// Entry for a fault raised inside an iteration.
    pub fn error(source: EntrySource, payload: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(source, payload, Outcome::Error(message.into()))
    }
}
