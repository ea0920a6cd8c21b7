//! QueryInput: single-line search bar built on tui-input.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryAction {
    Changed(String),
    /// Enter: the text to submit, untrimmed.
    Submitted(String),
    Cancelled,
    None,
}

pub struct QueryInput {
    input: Input,
    active: bool,
    placeholder: String,
}

impl QueryInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Esc clears non-empty text first and closes the bar on a second press.
    /// Enter submits and closes.
    pub fn handle_key(&mut self, key: KeyEvent) -> QueryAction {
        match key.code {
            KeyCode::Esc => {
                if self.input.value().is_empty() {
                    self.deactivate();
                    QueryAction::Cancelled
                } else {
                    self.input = Input::default();
                    QueryAction::Changed(String::new())
                }
            }
            KeyCode::Enter => {
                self.deactivate();
                QueryAction::Submitted(self.input.value().to_string())
            }
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() == before {
                    QueryAction::None
                } else {
                    QueryAction::Changed(self.input.value().to_string())
                }
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(4) as usize);
        let value = self.input.value();
        let display = if value.is_empty() && !self.active {
            Span::styled(format!("/ {}", self.placeholder), Style::default().fg(C_MUTED))
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(format!("/ {}", visible), Style::default().fg(C_FILTER_FG))
        };

        frame.render_widget(
            Paragraph::new(Line::from(vec![display])).style(Style::default().bg(C_FILTER_BG)),
            area,
        );

        if self.active && area.width > 0 {
            let cursor_x = area.x + 2 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}
