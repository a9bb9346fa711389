//! Dashboard rendering.
//!
//! Layout: header (connection + loop state), commands on the left, history
//! on the right, key hints in the footer.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::colors;
use super::state::DashboardState;
use crate::history::{HistoryEntry, Outcome};
use crate::recognition::RecognitionKind;

/// Draw the whole dashboard.
pub fn render(state: &DashboardState, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
        .split(frame.area());

    render_header(state, frame, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);
    render_commands(state, frame, body[0]);
    render_history(state, frame, body[1]);

    render_footer(state, frame, chunks[2]);
}

fn loop_span(state: &DashboardState, kind: RecognitionKind) -> Span<'static> {
    let (label, color) = if state.is_enabled(kind) {
        ("on", colors::ENABLED)
    } else {
        ("off", colors::DISABLED)
    };
    Span::styled(format!("{}: {}", kind, label), Style::default().fg(color))
}

fn render_header(state: &DashboardState, frame: &mut Frame, area: Rect) {
    let server = if state.is_connected() {
        Span::styled("● connected", Style::default().fg(colors::ENABLED))
    } else {
        Span::styled("○ unreachable", Style::default().fg(colors::ERROR))
    };
    let line = Line::from(vec![
        server,
        Span::raw(" │ "),
        loop_span(state, RecognitionKind::Voice),
        Span::raw(" │ "),
        loop_span(state, RecognitionKind::Visual),
    ]);
    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" handsfree ")
            .title_style(Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(header, area);
}

fn render_commands(state: &DashboardState, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = state
        .commands
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let style = if i == state.selected {
                Style::default().bg(colors::SELECTED).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(name.clone()).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Commands ({}) ", state.commands.len())),
    );
    frame.render_widget(list, area);
}

fn outcome_style(outcome: &Outcome) -> Style {
    let color = match outcome {
        Outcome::Success => colors::ENABLED,
        Outcome::Detected => colors::HEADER,
        Outcome::UnknownCommand => colors::WARN,
        Outcome::Error(_) => colors::ERROR,
    };
    Style::default().fg(color)
}

fn format_entry(entry: &HistoryEntry) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(entry.timestamp.clone(), Style::default().fg(colors::DIM)),
        Span::raw(format!(" [{}] ", entry.source.as_str())),
        Span::raw(entry.payload.clone()),
        Span::raw(" - "),
        Span::styled(entry.outcome.label(), outcome_style(&entry.outcome)),
    ];
    if let Outcome::Error(message) = &entry.outcome {
        spans.push(Span::styled(format!(": {}", message), outcome_style(&entry.outcome)));
    }
    ListItem::new(Line::from(spans))
}

fn render_history(state: &DashboardState, frame: &mut Frame, area: Rect) {
    // Newest at the top; only as many as fit
    let visible = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = state.history.iter().rev().take(visible).map(format_entry).collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" History ({}) ", state.history.len())),
    );
    frame.render_widget(list, area);
}

fn render_footer(state: &DashboardState, frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(colors::KEYBIND));
    let mut spans = vec![
        key("v"),
        Span::raw(" voice  "),
        key("g"),
        Span::raw(" visual  "),
        key("j/k"),
        Span::raw(" select  "),
        key("enter"),
        Span::raw(" run  "),
        key("r"),
        Span::raw(" refresh  "),
        key("q"),
        Span::raw(" quit"),
    ];
    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" │ "));
        spans.push(Span::raw(message.clone()));
    }
    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
