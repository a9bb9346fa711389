//! Dashboard state and key handling.
//!
//! `DashboardState` holds the last snapshot fetched from the server plus
//! selection and pending-action state. Keys never talk to the server
//! directly; they queue a `PendingAction` for the runner.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::history::HistoryEntry;
use crate::recognition::RecognitionKind;
use crate::server::HealthResponse;

/// Something the runner should do on the next loop turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Flip the given loop's enabled flag
    Toggle(RecognitionKind),
    /// Run the named command
    Execute(String),
    /// Fetch status and history now
    Refresh,
}

/// All mutable dashboard state.
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Last health reply, `None` while the server is unreachable
    pub health: Option<HealthResponse>,
    pub commands: Vec<String>,
    pub selected: usize,
    pub history: Vec<HistoryEntry>,
    /// One-line feedback shown in the footer
    pub status_message: Option<String>,
    pub pending_action: Option<PendingAction>,
    pub should_quit: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.health.is_some()
    }

    pub fn is_enabled(&self, kind: RecognitionKind) -> bool {
        match (self.health, kind) {
            (Some(h), RecognitionKind::Voice) => h.voice_enabled,
            (Some(h), RecognitionKind::Visual) => h.visual_enabled,
            (None, _) => false,
        }
    }

    pub fn selected_command(&self) -> Option<&str> {
        self.commands.get(self.selected).map(String::as_str)
    }

    /// Replace the command list, keeping the selection in range.
    pub fn set_commands(&mut self, commands: Vec<String>) {
        self.commands = commands;
        if self.selected >= self.commands.len() {
            self.selected = self.commands.len().saturating_sub(1);
        }
    }

    pub fn select_next(&mut self) {
        if !self.commands.is_empty() {
            self.selected = (self.selected + 1) % self.commands.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.commands.is_empty() {
            self.selected = self.selected.checked_sub(1).unwrap_or(self.commands.len() - 1);
        }
    }

    /// Apply a key press. Returns true if quit was requested.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            _ if ctrl_c => self.should_quit = true,
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('v') => self.pending_action = Some(PendingAction::Toggle(RecognitionKind::Voice)),
            KeyCode::Char('g') => self.pending_action = Some(PendingAction::Toggle(RecognitionKind::Visual)),
            KeyCode::Char('r') => self.pending_action = Some(PendingAction::Refresh),
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Enter => {
                if let Some(command) = self.selected_command() {
                    self.pending_action = Some(PendingAction::Execute(command.to_string()));
                }
            }
            _ => {}
        }
        self.should_quit
    }
}
