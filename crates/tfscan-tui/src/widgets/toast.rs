//! Toast notifications: transient `{ severity, title, description }`
//! messages stacked in the top-right corner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::{
    C_BG, C_SECONDARY, C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn icon(self) -> &'static str {
        match self {
            Severity::Info => "·",
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        }
    }

    fn color(self) -> ratatui::style::Color {
        match self {
            Severity::Info => C_TOAST_INFO,
            Severity::Success => C_TOAST_SUCCESS,
            Severity::Warning => C_TOAST_WARNING,
            Severity::Error => C_TOAST_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    expires: Instant,
}

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    max_visible: usize,
    error_duration: Duration,
}

impl ToastManager {
    pub fn new(error_duration: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            max_visible: 3,
            error_duration,
        }
    }

    pub fn push(
        &mut self,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        duration: Duration,
    ) {
        let title = title.into();
        let description = description.into();
        // Same message again just refreshes its position and lifetime
        self.toasts
            .retain(|t| !(t.title == title && t.description == description));
        self.toasts.push_back(Toast {
            severity,
            title,
            description,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Severity::Info, title, description, Duration::from_secs(3));
    }

    pub fn success(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Severity::Success, title, description, Duration::from_secs(3));
    }

    pub fn warning(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Severity::Warning, title, description, Duration::from_secs(4));
    }

    pub fn error(&mut self, title: impl Into<String>, description: impl Into<String>) {
        let duration = self.error_duration;
        self.push(Severity::Error, title, description, duration);
    }

    /// Drop expired toasts. Returns `true` if anything was removed.
    pub fn tick(&mut self) -> bool {
        self.expire(Instant::now())
    }

    fn expire(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires > now);
        self.toasts.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Newest first, capped at what fits on screen.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().rev().take(self.max_visible)
    }

    /// Render toasts in the top-right corner of `area`.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let width = (area.width / 2).clamp(30, 56).min(area.width);
        let mut y = area.y + 1;

        for toast in self.visible() {
            let color = toast.severity.color();
            let lines = vec![
                Line::from(Span::styled(
                    format!("{} {}", toast.severity.icon(), toast.title),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    toast.description.clone(),
                    Style::default().fg(C_SECONDARY),
                )),
            ];
            // Borders + title + wrapped description
            let inner_w = width.saturating_sub(2).max(1) as usize;
            let desc_rows = toast.description.chars().count().div_ceil(inner_w).max(1) as u16;
            let height = (desc_rows + 3).min(6);
            if y + height > area.y + area.height {
                break;
            }
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(width + 1),
                y,
                width,
                height,
            };
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(lines)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(color))
                            .style(Style::default().bg(C_BG)),
                    )
                    .wrap(Wrap { trim: true }),
                toast_area,
            );
            y += height;
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
