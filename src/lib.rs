//! Offline-first client for the Rick and Morty API.
//!
//! Characters are cached in SQLite and listed page by page; single
//! characters missing from the cache are fetched and written back on demand.

pub mod cache;
pub mod config;
pub mod logging;
pub mod rm;
