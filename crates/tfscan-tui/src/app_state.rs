//! AppState: shared read-only data passed to all components during render/event.
//!
//! Components read this for session data, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use tfscan_proto::state::SessionState;

use crate::widgets::status_bar::InputMode;

/// Maximum in-memory log lines kept for the status line.
pub const MAX_LOG_LINES: usize = 200;

pub struct AppState {
    /// Candidates, selection, results and busy tracking.
    pub session: SessionState,
    /// Current search box text; match badges are computed against it.
    pub query_text: String,
    /// Last submitted query, `None` until the first search.
    pub last_query: Option<String>,
    pub input_mode: InputMode,
    /// Service root shown in the header.
    pub api_base: String,
    /// Recent event lines, oldest first.
    pub logs: Vec<String>,
}

impl AppState {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            session: SessionState::new(),
            query_text: String::new(),
            last_query: None,
            input_mode: InputMode::Normal,
            api_base: api_base.into(),
            logs: Vec::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.logs.push(format!("{} {}", stamp, msg.into()));
        if self.logs.len() > MAX_LOG_LINES {
            let excess = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(..excess);
        }
    }

    pub fn last_log(&self) -> Option<&str> {
        self.logs.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_ring_is_bounded() {
        let mut state = AppState::new("http://localhost:8000");
        for i in 0..(MAX_LOG_LINES + 5) {
            state.push_log(format!("line {}", i));
        }
        assert_eq!(state.logs.len(), MAX_LOG_LINES);
        assert!(state.logs[0].ends_with("line 5"));
        assert!(state.last_log().unwrap().ends_with(&format!("line {}", MAX_LOG_LINES + 4)));
    }
}
