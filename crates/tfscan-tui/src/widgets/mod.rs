pub mod pane_chrome;
pub mod query_input;
pub mod scrollable_list;
pub mod status_bar;
pub mod text_area;
pub mod toast;
