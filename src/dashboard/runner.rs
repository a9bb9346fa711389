//! Dashboard runner - main event loop.
//!
//! Owns the terminal, state, event handler and API client. Each turn:
//! render → handle event → process pending action → refresh if due.

use std::time::{Duration, Instant};

use eyre::Result;
use log::{debug, info, warn};

use super::Tui;
use super::events::{Event, EventHandler};
use super::state::{DashboardState, PendingAction};
use super::views::render;
use crate::client::ApiClient;

/// Entries fetched per refresh.
const HISTORY_LIMIT: usize = 50;

pub struct DashboardRunner {
    terminal: Tui,
    state: DashboardState,
    event_handler: EventHandler,
    client: ApiClient,
    refresh_every: Duration,
    last_refresh: Option<Instant>,
}

impl DashboardRunner {
    pub fn new(terminal: Tui, client: ApiClient, tick_rate_ms: u64, refresh_ms: u64) -> Self {
        Self {
            terminal,
            state: DashboardState::new(),
            event_handler: EventHandler::new(tick_rate_ms),
            client,
            refresh_every: Duration::from_millis(refresh_ms),
            last_refresh: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Starting dashboard against {}", self.client.base_url());

        loop {
            if self.refresh_due() {
                self.refresh().await;
            }

            self.terminal.draw(|f| render(&self.state, f))?;

            match self.event_handler.next().await? {
                Event::Key(key) => {
                    if self.state.handle_key(key) {
                        break;
                    }
                }
                Event::Tick | Event::Resize(_, _) => {}
            }

            if let Some(action) = self.state.pending_action.take() {
                self.handle_action(action).await;
            }

            if self.state.should_quit {
                break;
            }
        }

        info!("Dashboard closed");
        Ok(())
    }

    fn refresh_due(&self) -> bool {
        self.last_refresh.is_none_or(|at| at.elapsed() >= self.refresh_every)
    }

    /// Pull health, commands and history. Failures mark the server unreachable.
    async fn refresh(&mut self) {
        self.last_refresh = Some(Instant::now());

        match self.client.health().await {
            Ok(health) => self.state.health = Some(health),
            Err(e) => {
                debug!("health check failed: {}", e);
                self.state.health = None;
                return;
            }
        }

        if self.state.commands.is_empty() {
            match self.client.commands().await {
                Ok(commands) => self.state.set_commands(commands),
                Err(e) => warn!("Failed to fetch commands: {}", e),
            }
        }

        match self.client.history(Some(HISTORY_LIMIT)).await {
            Ok(history) => self.state.history = history,
            Err(e) => warn!("Failed to fetch history: {}", e),
        }
    }

    async fn handle_action(&mut self, action: PendingAction) {
        let message = match action {
            PendingAction::Toggle(kind) => {
                let enable = !self.state.is_enabled(kind);
                match self.client.toggle(kind, enable).await {
                    Ok(result) => format!("{} {}", kind, if result.enabled { "enabled" } else { "disabled" }),
                    Err(e) => format!("Toggle {} failed: {}", kind, e),
                }
            }
            PendingAction::Execute(command) => match self.client.execute(&command).await {
                Ok(reply) => reply.message,
                Err(e) => e.to_string(),
            },
            PendingAction::Refresh => "Refreshed".to_string(),
        };
        info!("{}", message);
        self.state.status_message = Some(message);
        // Show the effect right away instead of waiting for the next interval
        self.last_refresh = None;
    }
}
