//! Status bar: last log line plus a mode label and keybinding hints.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{
    C_ACCENT, C_MODE_EDIT, C_MODE_NORMAL, C_MODE_QUERY, C_MUTED, C_SECONDARY, C_SELECTED_TF,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    /// Search bar open.
    Query,
    /// Sequence editor focused and taking text.
    Edit,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Query => "SEARCH",
            Self::Edit => "EDIT",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Query => C_MODE_QUERY,
            Self::Edit => C_MODE_EDIT,
        }
    }

    fn hints(self) -> &'static str {
        match self {
            Self::Normal => {
                " / search  ↑↓/jk move  Enter select  x unselect  y copy hits  Ctrl+R scan  Tab/1-3 panes  ? help  q quit"
            }
            Self::Query => " type query  Enter search  Esc clear/close",
            Self::Edit => " type or paste sequence  Ctrl+V paste  Ctrl+U clear  Ctrl+R/F5 scan  Esc leave",
        }
    }
}

/// Last log line, prefixed by a dot that lights up while requests are pending.
pub fn draw_log_bar(frame: &mut Frame, area: Rect, last_log: Option<&str>, busy: bool) {
    let dot = if busy {
        Span::styled("●", Style::default().fg(C_ACCENT))
    } else {
        Span::styled("●", Style::default().fg(C_SELECTED_TF))
    };
    let line = Line::from(vec![
        dot,
        Span::raw(" "),
        Span::styled(last_log.unwrap_or(""), Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(mode.hints(), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
