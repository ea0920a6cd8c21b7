//! SequenceEditor component: free-text DNA input (pane 2).
//!
//! Every edit re-emits the whole buffer as `SequenceEdited`, so the session's
//! normalized sequence always mirrors what is on screen.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use tfscan_proto::state::OpKind;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_secondary, C_BADGE_BUSY, C_HEADER_NAME, C_PRIMARY, C_TOAST_WARNING},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        text_area::TextBuffer,
    },
};

pub struct SequenceEditor {
    buffer: TextBuffer,
    scroll: usize,
}

impl SequenceEditor {
    pub fn new() -> Self {
        Self {
            buffer: TextBuffer::new(),
            scroll: 0,
        }
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Insert pasted text at the cursor.
    pub fn insert_text(&mut self, text: &str) -> Vec<Action> {
        self.buffer.insert_str(text);
        self.edited()
    }

    fn edited(&self) -> Vec<Action> {
        vec![Action::SequenceEdited(self.text())]
    }

    fn info_line(state: &AppState) -> Line<'static> {
        let Some(seq) = state.session.sequence().filter(|s| s.is_scannable()) else {
            return Line::from(Span::styled(
                " paste raw residues or a FASTA record",
                style_muted(),
            ));
        };
        let mut spans = Vec::new();
        if let Some(name) = &seq.display_name {
            let label = if name.is_empty() { "(unnamed)" } else { name.as_str() };
            spans.push(Span::styled(
                format!(" >{}", label),
                Style::default().fg(C_HEADER_NAME).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw("  "));
        } else {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("{} residues", seq.residue_count()),
            style_secondary(),
        ));
        if seq.has_wrapped_body() {
            spans.push(Span::styled(
                "  body spans several lines, sent as typed",
                Style::default().fg(C_TOAST_WARNING),
            ));
        }
        Line::from(spans)
    }
}

impl Default for SequenceEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SequenceEditor {
    fn id(&self) -> ComponentId {
        ComponentId::SequenceEditor
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::F(5) => return vec![Action::RunScan],
            KeyCode::Char('r') if ctrl => return vec![Action::RunScan],
            KeyCode::Char('v') if ctrl => return vec![Action::PasteFromClipboard],
            KeyCode::Char('u') if ctrl => {
                self.buffer.clear();
                self.scroll = 0;
                return self.edited();
            }
            KeyCode::Esc => return vec![Action::FocusNext],
            KeyCode::Char(c) if !ctrl => {
                self.buffer.insert_char(c);
                return self.edited();
            }
            KeyCode::Enter => {
                self.buffer.newline();
                return self.edited();
            }
            KeyCode::Backspace => {
                self.buffer.backspace();
                return self.edited();
            }
            KeyCode::Delete => {
                self.buffer.delete();
                return self.edited();
            }
            KeyCode::Left => self.buffer.move_left(),
            KeyCode::Right => self.buffer.move_right(),
            KeyCode::Up => self.buffer.move_up(),
            KeyCode::Down => self.buffer.move_down(),
            KeyCode::Home => self.buffer.home(),
            KeyCode::End => self.buffer.end(),
            _ => {}
        }
        vec![]
    }

    fn captures_text(&self) -> bool {
        true
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = state.session.is_busy(OpKind::Scan).then_some(Badge {
            text: "scanning",
            color: C_BADGE_BUSY,
        });
        let block = pane_chrome("sequence", Some('2'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 2 {
            return;
        }

        let info_area = Rect { height: 1, ..inner };
        let text_area = Rect {
            y: inner.y + 1,
            height: inner.height - 1,
            ..inner
        };
        frame.render_widget(Paragraph::new(Self::info_line(state)), info_area);

        let (row, _) = self.buffer.cursor();
        let height = text_area.height as usize;
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + height {
            self.scroll = row + 1 - height;
        }

        if self.buffer.is_empty() && !focused {
            frame.render_widget(
                Paragraph::new(Span::styled(" press 2 to type, or paste", style_muted())),
                text_area,
            );
            return;
        }

        let lines: Vec<Line> = self
            .buffer
            .lines()
            .iter()
            .skip(self.scroll)
            .take(height)
            .map(|l| Line::from(Span::styled(format!(" {}", l), Style::default().fg(C_PRIMARY))))
            .collect();
        frame.render_widget(Paragraph::new(lines), text_area);

        if focused {
            let col = 1 + self.buffer.cursor_display_col() as u16;
            let x = (text_area.x + col).min(text_area.x + text_area.width.saturating_sub(1));
            let y = text_area.y + (row - self.scroll) as u16;
            frame.set_cursor_position((x, y));
        }
    }
}
