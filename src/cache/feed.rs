//! Live view over the cached character collection.

use futures::stream::{self, Stream};
use std::sync::Arc;
use tokio::sync::watch;

use super::traits::{CharacterStore, StoreResult};
use crate::rm::types::Character;

/// Subscription to "all cached characters".
///
/// Emits a fresh snapshot, in insertion order, after every store mutation.
pub struct CharacterFeed<S: CharacterStore> {
  store: Arc<S>,
  changes: watch::Receiver<u64>,
}

impl<S: CharacterStore> CharacterFeed<S> {
  pub fn new(store: Arc<S>) -> Self {
    let changes = store.subscribe();
    Self { store, changes }
  }

  /// Snapshot of the cache as it is now.
  pub fn current(&self) -> StoreResult<Vec<Character>> {
    Ok(
      self
        .store
        .all()?
        .iter()
        .map(|record| record.to_model())
        .collect(),
    )
  }

  /// Wait for the next mutation and return the new snapshot.
  ///
  /// Returns `None` only if the change channel closes, which cannot happen
  /// while the feed keeps its store alive.
  pub async fn changed(&mut self) -> Option<StoreResult<Vec<Character>>> {
    self.changes.changed().await.ok()?;
    self.changes.borrow_and_update();
    Some(self.current())
  }

  /// Turn the feed into a stream whose first item is the current snapshot.
  pub fn into_stream(self) -> impl Stream<Item = StoreResult<Vec<Character>>> {
    stream::unfold((self, true), |(mut feed, first)| async move {
      let item = if first {
        feed.changes.borrow_and_update();
        feed.current()
      } else {
        feed.changed().await?
      };
      Some((item, (feed, false)))
    })
  }
}
