//! Core traits and types for the character cache.

use thiserror::Error;
use tokio::sync::watch;

use crate::rm::record::CharacterRecord;

/// Persisted value meaning "no more pages".
pub const TERMINAL_PAGE: i64 = -1;

/// First page of the remote listing.
pub const FIRST_PAGE: i64 = 1;

/// Position of the paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
  /// The next page to fetch
  Next(i64),
  /// The remote source reported no further page
  Exhausted,
}

impl PageCursor {
  /// Decode the persisted integer form.
  pub fn from_stored(value: i64) -> Self {
    if value == TERMINAL_PAGE {
      Self::Exhausted
    } else {
      Self::Next(value)
    }
  }

  pub fn to_stored(self) -> i64 {
    match self {
      Self::Next(page) => page,
      Self::Exhausted => TERMINAL_PAGE,
    }
  }
}

impl Default for PageCursor {
  fn default() -> Self {
    Self::Next(FIRST_PAGE)
  }
}

/// Local store failures.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("failed to (de)serialize stored value: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("corrupt row for character {id}: {reason}")]
  Corrupt { id: i64, reason: String },

  #[error("lock poisoned: {0}")]
  LockPoisoned(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistent collection of cached characters plus the pagination cursor.
///
/// Every successful mutation bumps the version published through
/// [`CharacterStore::subscribe`].
pub trait CharacterStore: Send + Sync {
  /// Subscribe to mutation notifications. The value is a version counter.
  fn subscribe(&self) -> watch::Receiver<u64>;

  /// All cached characters in insertion order.
  fn all(&self) -> StoreResult<Vec<CharacterRecord>>;

  /// True when no character is cached.
  fn is_empty(&self) -> StoreResult<bool>;

  fn get_by_id(&self, id: i64) -> StoreResult<Option<CharacterRecord>>;

  /// Insert or overwrite by id.
  fn upsert(&self, record: &CharacterRecord) -> StoreResult<()>;

  /// Insert or overwrite a batch by id, all or nothing.
  fn upsert_batch(&self, records: &[CharacterRecord]) -> StoreResult<()>;

  /// Read the persisted cursor. An unset cursor is the first page.
  fn read_cursor(&self) -> StoreResult<PageCursor>;

  fn write_cursor(&self, cursor: PageCursor) -> StoreResult<()>;

  /// Persist a fetched page: the new cursor and the page's records land
  /// together or not at all.
  fn commit_page(&self, cursor: PageCursor, records: &[CharacterRecord]) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cursor_stored_form() {
    assert_eq!(PageCursor::from_stored(-1), PageCursor::Exhausted);
    assert_eq!(PageCursor::from_stored(3), PageCursor::Next(3));
    assert_eq!(PageCursor::Exhausted.to_stored(), -1);
    assert_eq!(PageCursor::default(), PageCursor::Next(1));
  }
}
