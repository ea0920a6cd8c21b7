//! Shared core for the tfscan client: wire types, the sequence normalizer,
//! the HTTP client for the catalog/scan service and the session state the
//! terminal UI renders from.

pub mod client;
pub mod config;
pub mod error;
pub mod platform;
pub mod protocol;
pub mod sequence;
pub mod state;
