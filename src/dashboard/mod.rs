//! Terminal dashboard for a running handsfree server.
//!
//! Shows server and loop state, the available commands and recent history.
//! Talks to the server only through `ApiClient`.

mod events;
mod runner;
mod state;
mod views;

pub use events::{Event, EventHandler};
pub use runner::DashboardRunner;
pub use state::{DashboardState, PendingAction};

use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use eyre::Result;
use ratatui::prelude::*;
use std::io::{Stdout, stdout};

use crate::client::ApiClient;

/// Type alias for our terminal backend.
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Enable raw mode and switch to the alternate screen.
pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Disable raw mode and leave the alternate screen.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the dashboard until the user quits. The terminal is restored even if
/// the loop fails.
pub async fn run(client: ApiClient, tick_rate_ms: u64, refresh_ms: u64) -> Result<()> {
    let terminal = init_terminal()?;
    let mut runner = DashboardRunner::new(terminal, client, tick_rate_ms, refresh_ms);
    let result = runner.run().await;
    restore_terminal()?;
    result
}

pub mod colors {
    use ratatui::style::Color;

    pub const ENABLED: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const DISABLED: Color = Color::DarkGray;
    pub const WARN: Color = Color::Rgb(255, 215, 0); // Gold
    pub const ERROR: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255);
    pub const SELECTED: Color = Color::Rgb(60, 60, 60);
    pub const DIM: Color = Color::DarkGray;
}
