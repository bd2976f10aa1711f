//! Local persistence for the character cache.
//!
//! This module provides:
//! - The `CharacterStore` abstraction consumed by the repositories
//! - A SQLite implementation with atomic page commits
//! - A live `CharacterFeed` that re-emits on every store mutation

mod feed;
mod storage;
mod traits;

pub use feed::CharacterFeed;
pub use storage::SqliteStorage;
pub use traits::{CharacterStore, PageCursor, StoreError, StoreResult, FIRST_PAGE, TERMINAL_PAGE};
