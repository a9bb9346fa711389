//! Wall-clock helpers for Handsfree
//!
//! History timestamps and generated file names both come from here.

use chrono::{DateTime, Local};

/// Format used for history entry timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    Local::now().timestamp_millis().max(0) as u64
}

/// Current local time formatted for a history entry.
///
/// Example: `2026-10-16 14:03:27`
pub fn timestamp() -> String {
    format_timestamp(&Local::now())
}

/// Format an arbitrary local time the way history entries are stamped.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// File name for a screenshot taken now.
///
/// Format: `screenshot_{unix_seconds}.png`
pub fn screenshot_file_name() -> String {
    format!("screenshot_{}.png", now_ms() / 1000)
}
