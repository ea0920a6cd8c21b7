//! SearchPanel component: query bar plus the candidate list (pane 1).

use std::time::Instant;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use tfscan_proto::protocol::TfCandidate;
use tfscan_proto::state::{classify_match, MatchKind, OpKind};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        C_BADGE_BUSY, C_BADGE_STALE, C_MATCH_EXACT, C_MATCH_PREFIX, C_MUTED, C_PRIMARY,
        C_SECONDARY, C_SELECTED_TF, C_SELECTION_BG,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        query_input::{QueryAction, QueryInput},
        scrollable_list::SelectableList,
    },
};

pub struct SearchPanel {
    query: QueryInput,
    list: SelectableList<TfCandidate>,
    last_click: Option<(usize, Instant)>,
}

impl SearchPanel {
    pub fn new() -> Self {
        Self {
            query: QueryInput::new("name or matrix id (e.g. RUNX1, MA0002)"),
            list: SelectableList::new(),
            last_click: None,
        }
    }

    /// Take the candidate list from the session after a search lands.
    /// The cursor moves to the selected candidate when it is still listed.
    pub fn sync_candidates(&mut self, state: &AppState) {
        self.list.set_items(state.session.candidates().to_vec());
        if let Some(id) = state.session.selected_candidate_id() {
            self.list.select_where(|c| c.id == id);
        }
    }

    fn select_current(&self) -> Vec<Action> {
        match self.list.selected_item() {
            Some(c) => vec![Action::SelectCandidate(c.id.clone())],
            None => vec![],
        }
    }

    fn render_item<'a>(
        &self,
        candidate: &'a TfCandidate,
        is_cursor: bool,
        state: &AppState,
    ) -> ListItem<'a> {
        let is_selected = state.session.selected_candidate_id() == Some(candidate.id.as_str());

        let (marker, marker_color) = if is_selected {
            ("●", C_SELECTED_TF)
        } else {
            (" ", C_MUTED)
        };
        let (badge, badge_color) = match classify_match(&candidate.display_name, &state.query_text)
        {
            Some(MatchKind::Exact) => ("=", C_MATCH_EXACT),
            Some(MatchKind::Prefix) => ("~", C_MATCH_PREFIX),
            None => (" ", C_MUTED),
        };

        let name_style = if is_selected {
            Style::default().fg(C_SELECTED_TF).add_modifier(Modifier::BOLD)
        } else if is_cursor {
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_SECONDARY)
        };

        let name = if candidate.display_name.is_empty() {
            candidate.id.as_str()
        } else {
            candidate.display_name.as_str()
        };

        let line = Line::from(vec![
            Span::styled(format!(" {} ", marker), Style::default().fg(marker_color)),
            Span::styled(format!("{} ", badge), Style::default().fg(badge_color)),
            Span::styled(name, name_style),
            Span::styled(format!("  {}", candidate.subtitle()), Style::default().fg(C_MUTED)),
        ]);
        let bg = if is_cursor {
            Style::default().bg(C_SELECTION_BG)
        } else {
            Style::default()
        };
        ListItem::new(line).style(bg)
    }
}

impl Default for SearchPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SearchPanel {
    fn id(&self) -> ComponentId {
        ComponentId::SearchPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        if self.query.is_active() {
            match key.code {
                KeyCode::Up => {
                    self.list.select_up(1);
                    return vec![];
                }
                KeyCode::Down => {
                    self.list.select_down(1);
                    return vec![];
                }
                _ => {}
            }
            return match self.query.handle_key(key) {
                QueryAction::Changed(q) => vec![Action::QueryChanged(q)],
                QueryAction::Submitted(q) => vec![Action::SubmitSearch(q), Action::CloseQuery],
                QueryAction::Cancelled => vec![Action::CloseQuery],
                QueryAction::None => vec![],
            };
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter | KeyCode::Char(' ') => return self.select_current(),
            KeyCode::Char('x') => return vec![Action::ClearSelection],
            KeyCode::Char('/') => {
                self.query.activate();
                return vec![Action::OpenQuery];
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        let rel_row = event.row.saturating_sub(area.y + 1) as usize;
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let is_double = self
                    .last_click
                    .map(|(row, t)| row == rel_row && t.elapsed().as_millis() < 400)
                    .unwrap_or(false);
                if self.list.handle_click(rel_row) && is_double {
                    self.last_click = None;
                    return self.select_current();
                }
                self.last_click = Some((rel_row, Instant::now()));
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::OpenQuery => self.query.activate(),
            Action::CloseQuery => self.query.deactivate(),
            _ => {}
        }
        vec![]
    }

    fn captures_text(&self) -> bool {
        self.query.is_active()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let session = &state.session;
        let title = match session.total_matches() {
            Some(total) if total as usize > self.list.len() => {
                format!("transcription factors ({} of {})", self.list.len(), total)
            }
            _ => format!("transcription factors ({})", self.list.len()),
        };
        let badge = if session.is_busy(OpKind::Search) {
            Some(Badge {
                text: "searching",
                color: C_BADGE_BUSY,
            })
        } else if !session.selection_is_listed() {
            Some(Badge {
                text: "selection not listed",
                color: C_BADGE_STALE,
            })
        } else {
            None
        };

        let block = pane_chrome(&title, Some('1'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let query_area = Rect {
            y: inner.y + inner.height - 1,
            height: 1,
            ..inner
        };
        let list_area = Rect {
            height: inner.height - 1,
            ..inner
        };
        self.query.draw(frame, query_area);

        if self.list.is_empty() {
            let msg = if session.is_busy(OpKind::Search) {
                "  searching…"
            } else if state.last_query.is_some() {
                "  no matching transcription factors"
            } else {
                "  press / to search the catalog"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                list_area,
            );
            return;
        }

        let height = list_area.height as usize;
        self.list.ensure_visible(height);
        let cursor = self.list.selected_index();
        let items: Vec<ListItem> = self
            .list
            .visible_items(height)
            .into_iter()
            .map(|(i, c)| self.render_item(c, i == cursor, state))
            .collect();
        frame.render_widget(List::new(items), list_area);
    }
}
