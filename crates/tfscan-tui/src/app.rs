//! App: component-based event loop.
//!
//! - `App` owns the components and `AppState`.
//! - Terminal input and request completions arrive as `AppMessage`s on one
//!   `tokio::mpsc` channel; the loop redraws after each batch.
//! - Components answer input with `Vec<Action>`; `apply_action` is the only
//!   place session state changes.
//! - Every request runs in its own task and always reports back, so the
//!   busy counters in the session cannot leak.

use std::future::Future;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use tfscan_proto::client::ApiClient;
use tfscan_proto::config::Config;
use tfscan_proto::error::ApiError;
use tfscan_proto::protocol::{ScanOutcome, SearchResponse};
use tfscan_proto::state::{Applied, OpKind, OpTicket};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        help_overlay::HelpOverlay, results_panel::ResultsPanel, search_panel::SearchPanel,
        sequence_editor::SequenceEditor,
    },
    focus::FocusRing,
    theme::{C_BADGE_BUSY, C_BG, C_HEADER_NAME, C_MUTED, C_SELECTED_TF},
    widgets::{
        status_bar::{self, InputMode},
        toast::ToastManager,
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    SearchDone(OpTicket, Result<SearchResponse, ApiError>),
    ScanDone(OpTicket, Result<ScanOutcome, ApiError>),
}

/// Screen rects from the last frame, for mouse hit-testing.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    search: Rect,
    sequence: Rect,
    results: Rect,
}

pub struct App {
    state: AppState,
    client: ApiClient,
    focus: FocusRing,
    search_panel: SearchPanel,
    sequence_editor: SequenceEditor,
    results_panel: ResultsPanel,
    help_overlay: HelpOverlay,
    toast: ToastManager,
    tick_interval: Duration,
    pane_areas: PaneAreas,
    tx: Option<mpsc::Sender<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, client: ApiClient) -> Self {
        Self {
            state: AppState::new(client.base_url()),
            client,
            focus: FocusRing::default(),
            search_panel: SearchPanel::new(),
            sequence_editor: SequenceEditor::new(),
            results_panel: ResultsPanel::new(),
            help_overlay: HelpOverlay::new(),
            toast: ToastManager::new(config.ui.toast_duration()),
            tick_interval: config.ui.tick_interval(),
            pane_areas: PaneAreas::default(),
            tx: None,
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): entering raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard/mouse/paste events ──────────────────────
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("terminal event read failed: {}", e);
                    break;
                }
            }
        });

        self.push_log(format!("service: {}", self.state.api_base));
        let result = self.event_loop(&mut terminal, &mut rx).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;
        info!("tfscan exiting");
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        rx: &mut mpsc::Receiver<AppMessage>,
    ) -> anyhow::Result<()> {
        let mut tick = tokio::time::interval(self.tick_interval);
        let mut needs_redraw = true;

        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
                needs_redraw = false;
            }
            if self.should_quit {
                return Ok(());
            }

            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        warn!("event channel closed");
                        return Ok(());
                    };
                    self.handle_message(msg);
                    // Drain whatever else is queued before the next frame.
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next);
                    }
                    needs_redraw = true;
                }
                _ = tick.tick() => {
                    if self.toast.tick() {
                        needs_redraw = true;
                    }
                }
            }
        }
    }

    // ── Message handler ───────────────────────────────────────────────────────

    fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(ev) => match ev {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        return;
                    }
                    for a in self.handle_key(key) {
                        self.dispatch(a);
                    }
                }
                Event::Mouse(mouse) => {
                    for a in self.handle_mouse(mouse) {
                        self.dispatch(a);
                    }
                }
                Event::Paste(text) => self.paste(&text),
                _ => {}
            },
            AppMessage::SearchDone(ticket, result) => self.on_search_done(ticket, result),
            AppMessage::ScanDone(ticket, result) => self.on_scan_done(ticket, result),
        }
        self.sync_input_mode();
    }

    fn on_search_done(&mut self, ticket: OpTicket, result: Result<SearchResponse, ApiError>) {
        let found = result.as_ref().map(|r| r.results.len()).ok();
        match self.state.session.apply_search_result(ticket, result) {
            Applied::Updated => {
                self.search_panel.sync_candidates(&self.state);
                let n = found.unwrap_or_default();
                self.push_log(format!("search: {} candidates", n));
                if n == 0 {
                    self.toast
                        .info("No matches", "No transcription factors matched the query");
                } else {
                    self.toast
                        .info("Search complete", format!("{} transcription factors", n));
                }
            }
            Applied::Failed(failure) => {
                self.push_log(format!("search failed: {}", failure.description));
                self.toast.error(failure.title(), failure.description);
            }
            Applied::Superseded => {}
        }
    }

    fn on_scan_done(&mut self, ticket: OpTicket, result: Result<ScanOutcome, ApiError>) {
        match self.state.session.apply_scan_result(ticket, result) {
            Applied::Updated => {
                let points = self.state.session.series().len();
                let hits = self.state.session.hits().len();
                self.push_log(format!("scan: {} positions, {} hits", points, hits));
                if hits == 0 {
                    self.toast
                        .info("Scan complete", "No qualifying binding sites found");
                } else {
                    self.toast
                        .success("Scan complete", format!("{} binding sites", hits));
                }
            }
            Applied::Failed(failure) => {
                self.push_log(format!("scan failed: {}", failure.description));
                self.toast.error(failure.title(), failure.description);
            }
            Applied::Superseded => {}
        }
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        // Help overlay swallows everything while open
        if self.help_overlay.is_visible() {
            return self.help_overlay.handle_key(key, &self.state);
        }

        let query_open = self.search_panel.captures_text();
        match key.code {
            KeyCode::Tab if query_open => return vec![Action::CloseQuery, Action::FocusNext],
            KeyCode::BackTab if query_open => return vec![Action::CloseQuery, Action::FocusPrev],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::F(5) => return vec![Action::RunScan],
            KeyCode::Char('r') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::RunScan]
            }
            _ => {}
        }

        let focused = self.focus.current();
        let typing = match focused {
            Some(ComponentId::SearchPanel) => query_open,
            Some(ComponentId::SequenceEditor) => self.sequence_editor.captures_text(),
            _ => false,
        };

        if !typing {
            match key.code {
                KeyCode::Char('q') => return vec![Action::Quit],
                KeyCode::Char('?') => return vec![Action::ToggleHelp],
                KeyCode::Char('1') => return vec![Action::FocusPane(ComponentId::SearchPanel)],
                KeyCode::Char('2') => return vec![Action::FocusPane(ComponentId::SequenceEditor)],
                KeyCode::Char('3') => return vec![Action::FocusPane(ComponentId::ResultsPanel)],
                KeyCode::Char('/') => return vec![Action::OpenQuery],
                _ => {}
            }
        }

        let s = &self.state;
        match focused {
            Some(ComponentId::SearchPanel) => self.search_panel.handle_key(key, s),
            Some(ComponentId::SequenceEditor) => self.sequence_editor.handle_key(key, s),
            Some(ComponentId::ResultsPanel) => self.results_panel.handle_key(key, s),
            _ => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if !matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        ) || self.help_overlay.is_visible()
        {
            return vec![];
        }

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas;
        let (col, row) = (event.column, event.row);
        let s = &self.state;
        let (id, mut actions) = if hit(areas.search, col, row) {
            (
                ComponentId::SearchPanel,
                self.search_panel.handle_mouse(event, areas.search, s),
            )
        } else if hit(areas.sequence, col, row) {
            (
                ComponentId::SequenceEditor,
                self.sequence_editor.handle_mouse(event, areas.sequence, s),
            )
        } else if hit(areas.results, col, row) {
            (
                ComponentId::ResultsPanel,
                self.results_panel.handle_mouse(event, areas.results, s),
            )
        } else {
            return vec![];
        };

        if matches!(event.kind, MouseEventKind::Down(_)) && !self.focus.is_focused(id) {
            actions.insert(0, Action::FocusPane(id));
        }
        actions
    }

    /// Bracketed paste lands in the sequence editor unless the search bar
    /// is open.
    fn paste(&mut self, text: &str) {
        if self.search_panel.captures_text() {
            debug!("paste ignored while the search bar is open");
            return;
        }
        self.focus.set(ComponentId::SequenceEditor);
        for a in self.sequence_editor.insert_text(text) {
            self.dispatch(a);
        }
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.search_panel.on_action(&action, s));
            out.extend(self.sequence_editor.on_action(&action, s));
            out.extend(self.results_panel.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        match &action {
            Action::SequenceEdited(_) | Action::QueryChanged(_) => {}
            _ => debug!("apply_action: {:?}", action),
        }
        match action {
            // ── Catalog ───────────────────────────────────────────────────────
            Action::QueryChanged(q) => self.state.query_text = q,
            Action::SubmitSearch(q) => self.start_search(q),
            Action::SelectCandidate(id) => {
                let label = self
                    .state
                    .session
                    .candidates()
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.display_name.clone())
                    .unwrap_or_default();
                self.push_log(format!("selected {} {}", id, label));
                self.state.session.select_candidate(id);
            }
            Action::ClearSelection => {
                if self.state.session.selected_candidate_id().is_some() {
                    self.push_log("selection cleared".to_string());
                }
                self.state.session.clear_selection();
            }

            // ── Sequence / scan ───────────────────────────────────────────────
            Action::SequenceEdited(text) => self.state.session.set_sequence_text(&text),
            Action::RunScan => self.start_scan(),

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::OpenQuery => self.focus.set(ComponentId::SearchPanel),
            Action::CloseQuery => {}

            // ── UI ────────────────────────────────────────────────────────────
            Action::ToggleHelp => {}
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let rows = text.lines().count().saturating_sub(1);
                        self.toast.success("Copied", format!("{} hits as TSV", rows));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error("Clipboard unavailable", e.to_string());
                    }
                }
            }
            Action::PasteFromClipboard => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.get_text()) {
                    Ok(text) => self.paste(&text),
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error("Clipboard unavailable", e.to_string());
                    }
                }
            }

            Action::Quit => self.should_quit = true,
        }
    }

    // ── Requests ──────────────────────────────────────────────────────────────

    fn start_search(&mut self, query: String) {
        self.state.query_text = query.clone();
        self.state.last_query = Some(query.clone());
        let ticket = self.state.session.begin_search();
        info!("search #{}: {:?}", ticket.generation, query);
        self.push_log(format!("searching {:?}", query));

        let client = self.client.clone();
        self.spawn_request(ticket, AppMessage::SearchDone, async move {
            client.search(&query).await
        });
    }

    fn start_scan(&mut self) {
        if !self.state.session.can_scan() {
            let session = &self.state.session;
            let reason = if session.is_busy(OpKind::Scan) {
                "A scan is already running"
            } else if session.selected_candidate_id().is_none() {
                "Select a transcription factor first"
            } else {
                "Enter a DNA sequence first"
            };
            self.toast.warning("Cannot scan yet", reason);
            return;
        }
        let Some((candidate_id, sequence)) = self.state.session.scan_input() else {
            return;
        };
        let ticket = self.state.session.begin_scan();
        info!(
            "scan #{}: {} against {} residues",
            ticket.generation,
            candidate_id,
            sequence.residue_count()
        );
        self.push_log(format!("scanning with {}", candidate_id));

        let client = self.client.clone();
        self.spawn_request(ticket, AppMessage::ScanDone, async move {
            client.scan(&candidate_id, &sequence).await
        });
    }

    /// Run `request` on its own task and post the result back.  A panicked
    /// task reports `ApiError::Aborted` so its ticket is still released.
    fn spawn_request<T, F>(
        &self,
        ticket: OpTicket,
        done: fn(OpTicket, Result<T, ApiError>) -> AppMessage,
        request: F,
    ) where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let Some(tx) = self.tx.clone() else {
            warn!("{} requested before the event loop started", ticket.kind.label());
            return;
        };
        tokio::spawn(async move {
            let result = match tokio::spawn(request).await {
                Ok(result) => result,
                Err(e) => {
                    error!("{} task failed: {}", ticket.kind.label(), e);
                    Err(ApiError::Aborted)
                }
            };
            if tx.send(done(ticket, result)).await.is_err() {
                debug!("{} finished after shutdown", ticket.kind.label());
            }
        });
    }

    fn push_log(&mut self, msg: String) {
        debug!("[log] {}", msg);
        self.state.push_log(msg);
    }

    fn sync_input_mode(&mut self) {
        self.state.input_mode = if self.search_panel.captures_text() {
            InputMode::Query
        } else if self.focus.is_focused(ComponentId::SequenceEditor) {
            InputMode::Edit
        } else {
            InputMode::Normal
        };
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(frame, outer[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
            .split(outer[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(body[1]);
        self.pane_areas = PaneAreas {
            search: body[0],
            sequence: right[0],
            results: right[1],
        };

        let focus = self.focus.current();
        let s = &self.state;
        self.search_panel
            .draw(frame, body[0], focus == Some(ComponentId::SearchPanel), s);
        self.sequence_editor
            .draw(frame, right[0], focus == Some(ComponentId::SequenceEditor), s);
        self.results_panel
            .draw(frame, right[1], focus == Some(ComponentId::ResultsPanel), s);

        let busy = s.session.is_busy(OpKind::Search) || s.session.is_busy(OpKind::Scan);
        status_bar::draw_log_bar(frame, outer[2], s.last_log(), busy);
        status_bar::draw_keys_bar(frame, outer[3], s.input_mode);

        self.help_overlay.draw(frame, area, false, s);
        self.toast.draw(frame, area);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let session = &self.state.session;
        let mut spans = vec![
            Span::styled(
                " tfscan",
                Style::default().fg(C_HEADER_NAME).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", self.state.api_base), Style::default().fg(C_MUTED)),
        ];
        if let Some(id) = session.selected_candidate_id() {
            let name = session
                .selected_candidate()
                .map(|c| c.display_name.as_str())
                .filter(|n| !n.is_empty())
                .unwrap_or(id);
            spans.push(Span::styled(
                format!("  TF {}", name),
                Style::default().fg(C_SELECTED_TF),
            ));
        }
        for kind in [OpKind::Search, OpKind::Scan] {
            if session.is_busy(kind) {
                spans.push(Span::styled(
                    format!("  {}…", kind.label()),
                    Style::default().fg(C_BADGE_BUSY),
                ));
            }
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
