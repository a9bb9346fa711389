//! Command history
//!
//! A bounded, timestamped record of every dispatch attempt made by the
//! recognition loops and by manual execution.

mod entry;
mod ring;

pub use entry::{EntrySource, HistoryEntry, Outcome};
pub use ring::{DEFAULT_CAPACITY, HistoryLog, SharedHistory};
