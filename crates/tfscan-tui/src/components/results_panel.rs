//! ResultsPanel component: score chart over the hit list (pane 3).

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use tfscan_proto::protocol::{BindingHit, ScorePoint};
use tfscan_proto::state::{OpKind, ResultsView};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_muted, style_secondary, C_BADGE_BUSY, C_HIT_RANGE, C_HIT_SCORE, C_MUTED, C_PRIMARY,
        C_SEPARATOR, C_SERIES,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

pub struct ResultsPanel {
    scroll: usize,
}

/// Hit list as tab-separated text with a header row.
pub fn hits_tsv(hits: &[BindingHit]) -> String {
    let mut out = String::from("start\tend\tscore\tsequence\n");
    for hit in hits {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            hit.start, hit.end, hit.score, hit.matched_residues
        ));
    }
    out
}

/// `Position 12-20: Score 7.41`, residues drawn separately.
fn hit_label(hit: &BindingHit) -> String {
    format!("Position {}-{}: Score {:.2}", hit.start, hit.end, hit.score)
}

/// Axis bounds with a little headroom.  A flat series still gets a
/// non-empty range.
fn bounds(series: &[ScorePoint]) -> ([f64; 2], [f64; 2]) {
    let (mut x0, mut x1) = (f64::MAX, f64::MIN);
    let (mut y0, mut y1) = (f64::MAX, f64::MIN);
    for p in series {
        x0 = x0.min(p.position as f64);
        x1 = x1.max(p.position as f64);
        y0 = y0.min(p.score);
        y1 = y1.max(p.score);
    }
    if x1 <= x0 {
        x1 = x0 + 1.0;
    }
    let pad = ((y1 - y0) * 0.05).max(0.5);
    ([x0, x1], [y0 - pad, y1 + pad])
}

impl ResultsPanel {
    pub fn new() -> Self {
        Self { scroll: 0 }
    }

    fn title(state: &AppState) -> String {
        match state.session.last_run() {
            Some(run) => match &run.sequence_name {
                Some(name) if !name.is_empty() => {
                    format!("results · {} on {}", run.candidate_id, name)
                }
                _ => format!("results · {}", run.candidate_id),
            },
            None => "results".to_string(),
        }
    }

    fn draw_chart(&self, frame: &mut Frame, area: Rect, series: &[ScorePoint]) {
        let points: Vec<(f64, f64)> = series
            .iter()
            .map(|p| (p.position as f64, p.score))
            .collect();
        let ([x0, x1], [y0, y1]) = bounds(series);

        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(C_SERIES))
            .data(&points);

        let axis_style = Style::default().fg(C_SEPARATOR);
        let chart = Chart::new(vec![dataset])
            .x_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds([x0, x1])
                    .labels(vec![
                        Span::styled(format!("{}", x0), style_muted()),
                        Span::styled(format!("{}", x1), style_muted()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds([y0, y1])
                    .labels(vec![
                        Span::styled(format!("{:.1}", y0), style_muted()),
                        Span::styled(format!("{:.1}", y1), style_muted()),
                    ]),
            );
        frame.render_widget(chart, area);
    }

    fn draw_hits(&mut self, frame: &mut Frame, area: Rect, hits: &[BindingHit]) {
        let height = area.height.saturating_sub(1) as usize;
        self.scroll = self.scroll.min(hits.len().saturating_sub(height.max(1)));

        let mut lines = vec![Line::from(Span::styled(
            format!(" top hits ({})", hits.len()),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ))];
        lines.extend(hits.iter().skip(self.scroll).take(height).map(|hit| {
            let mut spans = vec![
                Span::raw(" "),
                Span::styled(hit_label(hit), Style::default().fg(C_HIT_RANGE)),
            ];
            if !hit.matched_residues.is_empty() {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    hit.matched_residues.clone(),
                    Style::default().fg(C_HIT_SCORE),
                ));
            }
            Line::from(spans)
        }));
        frame.render_widget(Paragraph::new(lines), area);
    }
}

impl Default for ResultsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ResultsPanel {
    fn id(&self) -> ComponentId {
        ComponentId::ResultsPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll += 1,
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll += 10,
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::Char('y') => {
                let hits = state.session.hits();
                if !hits.is_empty() {
                    return vec![Action::CopyToClipboard(hits_tsv(hits))];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            MouseEventKind::ScrollDown => self.scroll += 1,
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::RunScan = action {
            self.scroll = 0;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let title = Self::title(state);
        let badge = state.session.is_busy(OpKind::Scan).then_some(Badge {
            text: "scanning",
            color: C_BADGE_BUSY,
        });
        let block = pane_chrome(&title, Some('3'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match state.session.results_view() {
            ResultsView::NotRun => {
                let hint = if state.session.can_scan() {
                    "  ready: press Ctrl+R to scan"
                } else {
                    "  select a transcription factor and enter a sequence to scan"
                };
                frame.render_widget(
                    Paragraph::new(Span::styled(hint, Style::default().fg(C_MUTED))),
                    inner,
                );
            }
            ResultsView::NoHits { series } => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(3), Constraint::Length(2)])
                    .split(inner);
                self.draw_chart(frame, rows[0], series);
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        "  no qualifying binding sites found",
                        style_secondary(),
                    )),
                    rows[1],
                );
            }
            ResultsView::Hits { series, hits } => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .split(inner);
                self.draw_chart(frame, rows[0], series);
                self.draw_hits(frame, rows[1], hits);
            }
        }
    }
}
