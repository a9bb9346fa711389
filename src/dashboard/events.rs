//! Event handling for the dashboard.
//!
//! - `Event`: keyboard, tick, resize
//! - `EventHandler`: polls crossterm on a blocking thread with a tick timeout

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use eyre::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    /// Poll timeout elapsed with no input
    Tick,
    Resize(u16, u16),
}

pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms),
        }
    }

    /// Wait for the next key, resize, or tick.
    pub async fn next(&self) -> Result<Event> {
        let tick_rate = self.tick_rate;

        let event = tokio::task::spawn_blocking(move || -> Result<Event> {
            if !event::poll(tick_rate)? {
                return Ok(Event::Tick);
            }
            Ok(match event::read()? {
                // Only presses; releases and repeats are ignored
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
                CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                _ => Event::Tick,
            })
        })
        .await??;

        Ok(event)
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(250)
    }
}
