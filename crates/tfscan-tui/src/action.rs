//! Action enum: all user-initiated intents.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    SearchPanel,
    SequenceEditor,
    ResultsPanel,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Catalog ──────────────────────────────────────────────────────────────
    /// Search box text changed (drives match badges, not a request).
    QueryChanged(String),
    SubmitSearch(String),
    SelectCandidate(String),
    ClearSelection,

    // ── Sequence / scan ──────────────────────────────────────────────────────
    SequenceEdited(String),
    RunScan,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── Input mode ───────────────────────────────────────────────────────────
    OpenQuery,
    CloseQuery,

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleHelp,
    CopyToClipboard(String),
    /// Put clipboard text into the sequence editor.
    PasteFromClipboard,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
