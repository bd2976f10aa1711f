//! Offline-first character repository.
//!
//! Reads are served from the local store. The remote API is consulted when
//! the store is empty, when the caller asks for more, or when a single
//! character is missing locally, and every remote hit is written back.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CharacterFeed, CharacterStore, PageCursor};

use super::error::{RepositoryError, RepositoryResult};
use super::record::{CharacterRecord, EpisodeIds};
use super::source::RemoteSource;
use super::types::{Character, CharacterDetails, Episode};

/// Character repository over a remote source and a local store.
pub struct CharacterRepository<R: RemoteSource, S: CharacterStore> {
  remote: Arc<R>,
  store: Arc<S>,
  /// Serialises the cursor read-fetch-commit cycle
  page_lock: Arc<AsyncMutex<()>>,
  /// One slot per id currently being fetched remotely
  in_flight: InFlightSlots,
}

impl<R, S> CharacterRepository<R, S>
where
  R: RemoteSource + 'static,
  S: CharacterStore + 'static,
{
  pub fn new(remote: Arc<R>, store: Arc<S>) -> Self {
    Self {
      remote,
      store,
      page_lock: Arc::new(AsyncMutex::new(())),
      in_flight: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Live view of every cached character, in insertion order.
  ///
  /// When the cache is empty a single page fetch is started in the
  /// background; the feed emits once its records land. Must be called from
  /// within a Tokio runtime.
  pub fn get_characters(&self) -> RepositoryResult<CharacterFeed<S>> {
    let feed = CharacterFeed::new(Arc::clone(&self.store));

    if self.store.is_empty()? {
      debug!("character cache empty, fetching first page in background");
      let repo = self.clone();
      tokio::spawn(async move {
        if let Err(e) = repo.fetch_next().await {
          warn!(error = %e, "background character page fetch failed");
        }
      });
    }

    Ok(feed)
  }

  /// Fetch the next page of characters into the cache.
  pub async fn load_more(&self) -> RepositoryResult<()> {
    self.fetch_next().await
  }

  /// Current pagination cursor.
  pub fn cursor(&self) -> RepositoryResult<PageCursor> {
    Ok(self.store.read_cursor()?)
  }

  async fn fetch_next(&self) -> RepositoryResult<()> {
    let _guard = self.page_lock.lock().await;

    let page = match self.store.read_cursor()? {
      PageCursor::Next(page) => page,
      PageCursor::Exhausted => {
        debug!("character listing exhausted, nothing to load");
        return Ok(());
      }
    };

    let response = self.remote.list_characters(page).await?;
    let next = next_cursor(response.info.next.as_deref());

    let cached_at = Utc::now();
    let records: Vec<CharacterRecord> = response
      .results
      .into_iter()
      .map(|c| c.into_record(cached_at))
      .collect();

    self.store.commit_page(next, &records)?;
    info!(page, count = records.len(), next = ?next, "committed character page");

    Ok(())
  }

  /// Resolve a character by id, mapped to the domain model.
  pub async fn get_character(&self, id: i64) -> RepositoryResult<Character> {
    Ok(self.resolve(id).await?.to_model())
  }

  /// Resolve a character together with the episodes it appears in.
  pub async fn get_character_detailed(&self, id: i64) -> RepositoryResult<CharacterDetails> {
    let record = self.resolve(id).await?;
    let episodes = self.episodes_for(&record.episode_ids).await?;

    Ok(CharacterDetails {
      character: record.to_model(),
      episodes,
    })
  }

  /// Episodes the given character appears in.
  pub async fn get_episodes_where(&self, character_id: i64) -> RepositoryResult<Vec<Episode>> {
    let record = self.resolve(character_id).await?;
    self.episodes_for(&record.episode_ids).await
  }

  /// Resolve episodes from an encoded id list (`"7"` or `"4,5,6"`).
  pub async fn get_episodes_from_id_list(&self, id_list: &str) -> RepositoryResult<Vec<Episode>> {
    let ids = EpisodeIds::decode(id_list)?;
    self.episodes_for(&ids).await
  }

  /// Local lookup with remote fallback.
  ///
  /// A remote hit is written to the store before returning. Concurrent calls
  /// for the same uncached id share a single remote request.
  pub async fn resolve(&self, id: i64) -> RepositoryResult<CharacterRecord> {
    if let Some(record) = self.store.get_by_id(id)? {
      debug!(id, "character cache hit");
      return Ok(record);
    }

    let in_flight = InFlight::join(&self.in_flight, id);
    let _turn = in_flight.lock.lock().await;
    self.resolve_remote(id).await
  }

  async fn resolve_remote(&self, id: i64) -> RepositoryResult<CharacterRecord> {
    // Filled by another caller while we waited for the slot
    if let Some(record) = self.store.get_by_id(id)? {
      return Ok(record);
    }

    debug!(id, "character cache miss, fetching remotely");
    let character = self
      .remote
      .get_character_by_id(id)
      .await?
      .ok_or(RepositoryError::NotFound(id))?;

    let record = character.into_record(Utc::now());
    self.store.upsert(&record)?;

    Ok(record)
  }

  async fn episodes_for(&self, ids: &EpisodeIds) -> RepositoryResult<Vec<Episode>> {
    // TODO: cache episodes in the local store; every call currently hits the network
    let episodes = match ids.as_slice() {
      [] => Vec::new(),
      [id] => self
        .remote
        .get_episode_by_id(*id)
        .await?
        .into_iter()
        .collect(),
      many => self.remote.get_episodes_by_ids(many).await?,
    };

    Ok(episodes.into_iter().map(Episode::from).collect())
  }
}

#[derive(Default)]
struct Slot {
  lock: Arc<AsyncMutex<()>>,
  claims: usize,
}

type InFlightSlots = Arc<Mutex<HashMap<i64, Slot>>>;

/// A caller's claim on the in-flight slot for one id.
///
/// Dropping it, whether the lookup finished or was cancelled, removes the
/// map entry once the last claim on that id is gone.
struct InFlight {
  id: i64,
  slots: InFlightSlots,
  lock: Arc<AsyncMutex<()>>,
}

impl InFlight {
  fn join(slots: &InFlightSlots, id: i64) -> Self {
    let mut map = slots.lock().unwrap_or_else(PoisonError::into_inner);
    let slot = map.entry(id).or_default();
    slot.claims += 1;

    Self {
      id,
      slots: Arc::clone(slots),
      lock: Arc::clone(&slot.lock),
    }
  }
}

impl Drop for InFlight {
  fn drop(&mut self) {
    let mut map = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(slot) = map.get_mut(&self.id) {
      slot.claims -= 1;
      if slot.claims == 0 {
        map.remove(&self.id);
      }
    }
  }
}

impl<R: RemoteSource, S: CharacterStore> Clone for CharacterRepository<R, S> {
  fn clone(&self) -> Self {
    Self {
      remote: Arc::clone(&self.remote),
      store: Arc::clone(&self.store),
      page_lock: Arc::clone(&self.page_lock),
      in_flight: Arc::clone(&self.in_flight),
    }
  }
}

/// Cursor after a page whose `info.next` is `pointer`.
///
/// A missing pointer ends the listing. So does a pointer without a usable
/// `page` query parameter, which is logged.
pub fn next_cursor(pointer: Option<&str>) -> PageCursor {
  let Some(pointer) = pointer else {
    return PageCursor::Exhausted;
  };

  match page_from_pointer(pointer) {
    Some(page) if page > 0 => PageCursor::Next(page),
    _ => {
      warn!(pointer, "malformed next-page pointer, treating listing as exhausted");
      PageCursor::Exhausted
    }
  }
}

fn page_from_pointer(pointer: &str) -> Option<i64> {
  let url = Url::parse(pointer).ok()?;
  let (_, page) = url.query_pairs().find(|(key, _)| key == "page")?;
  page.parse().ok()
}
