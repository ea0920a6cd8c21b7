//! Session state: candidate list, scan selection, latest scan results and
//! the busy tracking for both remote operations.
//!
//! One owner (the UI event loop) holds a `SessionState` and changes it only
//! through the named transitions below.  Remote calls are bracketed by a
//! `begin_*` that hands out an `OpTicket` and an `apply_*_result` that takes
//! it back; the ticket's generation decides whether the result is still
//! wanted.
//!
//! ```text
//!  begin_search ──► OpTicket(gen n) ──► apply_search_result
//!                                         ├─ gen n is newest, Ok   → Updated
//!                                         ├─ gen n is newest, Err  → Failed(notice)
//!                                         └─ newer gen issued      → Superseded
//! ```

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::protocol::{BindingHit, ScanOutcome, ScorePoint, SearchResponse, TfCandidate};
use crate::sequence::{normalize, NormalizedSequence};

/// The two independent remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Search,
    Scan,
}

impl OpKind {
    pub fn label(self) -> &'static str {
        match self {
            OpKind::Search => "search",
            OpKind::Scan => "scan",
        }
    }

    /// Notification title for a failure.
    pub fn error_title(self) -> &'static str {
        match self {
            OpKind::Search => "Error searching TFs",
            OpKind::Scan => "Error scanning sequence",
        }
    }

    /// Used when the service did not say what went wrong.
    pub fn default_error_message(self) -> &'static str {
        match self {
            OpKind::Search => "Failed to search transcription factors",
            OpKind::Scan => "Failed to scan DNA sequence",
        }
    }
}

/// Proof that a request was started.  Handed back on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTicket {
    pub kind: OpKind,
    pub generation: u64,
}

/// Busy/generation bookkeeping for one operation kind.
#[derive(Debug)]
pub struct OpTracker {
    kind: OpKind,
    issued: u64,
    in_flight: usize,
}

impl OpTracker {
    pub fn new(kind: OpKind) -> Self {
        Self {
            kind,
            issued: 0,
            in_flight: 0,
        }
    }

    /// Mark a request as in flight and return its ticket.
    pub fn begin(&mut self) -> OpTicket {
        self.issued += 1;
        self.in_flight += 1;
        OpTicket {
            kind: self.kind,
            generation: self.issued,
        }
    }

    /// Release a ticket.  Returns `true` when it belongs to the most recently
    /// issued request, i.e. its result should be applied.
    pub fn finish(&mut self, ticket: OpTicket) -> bool {
        debug_assert_eq!(ticket.kind, self.kind);
        self.in_flight = self.in_flight.saturating_sub(1);
        ticket.generation == self.issued
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn latest_generation(&self) -> u64 {
        self.issued
    }
}

/// User-facing description of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: OpKind,
    pub description: String,
}

impl Failure {
    pub fn from_error(kind: OpKind, err: &ApiError) -> Self {
        let description = err
            .service_message()
            .unwrap_or_else(|| kind.default_error_message())
            .to_string();
        Self { kind, description }
    }

    pub fn title(&self) -> &'static str {
        self.kind.error_title()
    }
}

/// What happened to a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The result replaced the held state.
    Updated,
    /// A newer request of the same kind exists; this one was dropped.
    Superseded,
    /// The request failed.  Held state is unchanged.
    Failed(Failure),
}

/// The pair a scan is computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSelection {
    pub candidate_id: Option<String>,
    pub sequence: Option<NormalizedSequence>,
}

impl ScanSelection {
    /// Both halves present and non-empty.
    pub fn is_complete(&self) -> bool {
        let has_id = self
            .candidate_id
            .as_deref()
            .is_some_and(|id| !id.is_empty());
        let has_seq = self
            .sequence
            .as_ref()
            .is_some_and(NormalizedSequence::is_scannable);
        has_id && has_seq
    }
}

/// What the displayed series/hits were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo {
    pub candidate_id: String,
    pub sequence_name: Option<String>,
}

/// How the results area should present itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultsView<'a> {
    /// No series yet: show neither chart nor hit list.
    NotRun,
    /// A scan produced scores but the service reported no hits.
    NoHits { series: &'a [ScorePoint] },
    Hits {
        series: &'a [ScorePoint],
        hits: &'a [BindingHit],
    },
}

/// How a candidate name relates to the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
}

/// Case-insensitive comparison of a candidate name with the trimmed query.
/// A blank query classifies nothing.
pub fn classify_match(display_name: &str, query: &str) -> Option<MatchKind> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    let name = display_name.to_lowercase();
    if name == query {
        Some(MatchKind::Exact)
    } else if name.starts_with(&query) {
        Some(MatchKind::Prefix)
    } else {
        None
    }
}

#[derive(Debug)]
pub struct SessionState {
    candidates: Vec<TfCandidate>,
    total_matches: Option<u64>,
    selection: ScanSelection,
    series: Vec<ScorePoint>,
    hits: Vec<BindingHit>,
    last_run: Option<RunInfo>,
    search: OpTracker,
    scan: OpTracker,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            total_matches: None,
            selection: ScanSelection::default(),
            series: Vec::new(),
            hits: Vec::new(),
            last_run: None,
            search: OpTracker::new(OpKind::Search),
            scan: OpTracker::new(OpKind::Scan),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub fn candidates(&self) -> &[TfCandidate] {
        &self.candidates
    }

    /// Catalog-side match count from the last search, when it reported one.
    pub fn total_matches(&self) -> Option<u64> {
        self.total_matches
    }

    pub fn selection(&self) -> &ScanSelection {
        &self.selection
    }

    pub fn selected_candidate_id(&self) -> Option<&str> {
        self.selection.candidate_id.as_deref()
    }

    pub fn sequence(&self) -> Option<&NormalizedSequence> {
        self.selection.sequence.as_ref()
    }

    pub fn series(&self) -> &[ScorePoint] {
        &self.series
    }

    pub fn hits(&self) -> &[BindingHit] {
        &self.hits
    }

    pub fn last_run(&self) -> Option<&RunInfo> {
        self.last_run.as_ref()
    }

    pub fn is_busy(&self, kind: OpKind) -> bool {
        self.tracker(kind).is_busy()
    }

    fn tracker(&self, kind: OpKind) -> &OpTracker {
        match kind {
            OpKind::Search => &self.search,
            OpKind::Scan => &self.scan,
        }
    }

    fn tracker_mut(&mut self, kind: OpKind) -> &mut OpTracker {
        match kind {
            OpKind::Search => &mut self.search,
            OpKind::Scan => &mut self.scan,
        }
    }

    // ── Projections ──────────────────────────────────────────────────────────

    /// The trigger is enabled only for a complete selection with no scan
    /// outstanding.
    pub fn can_scan(&self) -> bool {
        self.selection.is_complete() && !self.scan.is_busy()
    }

    /// Candidate id and sequence to scan, if the selection is complete.
    /// Does not look at the busy flag.
    pub fn scan_input(&self) -> Option<(String, NormalizedSequence)> {
        if !self.selection.is_complete() {
            return None;
        }
        let id = self.selection.candidate_id.clone()?;
        let seq = self.selection.sequence.clone()?;
        Some((id, seq))
    }

    pub fn results_view(&self) -> ResultsView<'_> {
        if self.series.is_empty() {
            ResultsView::NotRun
        } else if self.hits.is_empty() {
            ResultsView::NoHits {
                series: &self.series,
            }
        } else {
            ResultsView::Hits {
                series: &self.series,
                hits: &self.hits,
            }
        }
    }

    /// `false` when the selected id is not in the current candidate list.
    /// `true` when nothing is selected.
    pub fn selection_is_listed(&self) -> bool {
        match self.selected_candidate_id() {
            None => true,
            Some(id) => self.candidates.iter().any(|c| c.id == id),
        }
    }

    pub fn selected_candidate(&self) -> Option<&TfCandidate> {
        let id = self.selected_candidate_id()?;
        self.candidates.iter().find(|c| c.id == id)
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Re-normalize the editor text.  Runs on every edit.
    pub fn set_sequence_text(&mut self, raw: &str) {
        self.selection.sequence = Some(normalize(raw));
    }

    /// Select a candidate.  Prior results stay on screen until a new scan
    /// completes.
    pub fn select_candidate(&mut self, id: impl Into<String>) {
        self.selection.candidate_id = Some(id.into());
    }

    pub fn clear_selection(&mut self) {
        self.selection.candidate_id = None;
    }

    pub fn begin_search(&mut self) -> OpTicket {
        self.search.begin()
    }

    pub fn apply_search_result(
        &mut self,
        ticket: OpTicket,
        result: Result<SearchResponse, ApiError>,
    ) -> Applied {
        if !self.finish(ticket, result.as_ref().err()) {
            return Applied::Superseded;
        }
        match result {
            Ok(response) => {
                self.candidates = response.results;
                self.total_matches = response.count;
                Applied::Updated
            }
            Err(err) => Applied::Failed(Failure::from_error(OpKind::Search, &err)),
        }
    }

    /// Start a scan.  Unguarded: callers check `can_scan` first.
    pub fn begin_scan(&mut self) -> OpTicket {
        self.scan.begin()
    }

    pub fn apply_scan_result(
        &mut self,
        ticket: OpTicket,
        result: Result<ScanOutcome, ApiError>,
    ) -> Applied {
        if !self.finish(ticket, result.as_ref().err()) {
            return Applied::Superseded;
        }
        match result {
            Ok(outcome) => {
                self.series = outcome.series;
                self.hits = outcome.hits;
                self.last_run = Some(RunInfo {
                    candidate_id: outcome.candidate_id,
                    sequence_name: outcome.sequence_name,
                });
                Applied::Updated
            }
            Err(err) => Applied::Failed(Failure::from_error(OpKind::Scan, &err)),
        }
    }

    /// Release the ticket and say whether its result is still wanted.
    fn finish(&mut self, ticket: OpTicket, err: Option<&ApiError>) -> bool {
        let tracker = self.tracker_mut(ticket.kind);
        let latest = tracker.latest_generation();
        if tracker.finish(ticket) {
            return true;
        }
        match err {
            Some(e) => warn!(
                "{}: dropping failure of generation {} (latest {}): {}",
                ticket.kind.label(),
                ticket.generation,
                latest,
                e
            ),
            None => debug!(
                "{}: dropping result of generation {} (latest {})",
                ticket.kind.label(),
                ticket.generation,
                latest
            ),
        }
        false
    }
}
