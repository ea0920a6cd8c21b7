pub mod help_overlay;
pub mod results_panel;
pub mod search_panel;
pub mod sequence_editor;
