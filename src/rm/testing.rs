//! Fixtures and an in-process fake of the remote API.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::api_types::{
  ApiCharacter, ApiCharacterPage, ApiEpisode, ApiLocation, ApiLocationLink, ApiPageInfo,
};
use super::error::RemoteError;
use super::record::{CharacterRecord, EpisodeIds};
use super::source::RemoteSource;
use super::types::{CharacterGender, CharacterStatus, LocationRef};

const API: &str = "https://rickandmortyapi.com/api";

pub fn record(id: i64, name: &str) -> CharacterRecord {
  CharacterRecord {
    id,
    name: name.to_string(),
    status: CharacterStatus::Alive,
    species: "Human".to_string(),
    kind: String::new(),
    gender: CharacterGender::Male,
    origin: LocationRef {
      name: "Earth (C-137)".to_string(),
      id: Some(1),
    },
    location: LocationRef {
      name: "unknown".to_string(),
      id: None,
    },
    avatar_url: format!("{}/character/avatar/{}.jpeg", API, id),
    episode_ids: EpisodeIds::new(vec![1, 2]),
    location_preview: None,
    cached_at: Utc::now(),
  }
}

pub fn api_character(id: i64, episodes: &[i64]) -> ApiCharacter {
  ApiCharacter {
    id,
    name: format!("Character {}", id),
    status: "Alive".to_string(),
    species: "Human".to_string(),
    kind: String::new(),
    gender: "Female".to_string(),
    origin: ApiLocationLink {
      name: "unknown".to_string(),
      url: String::new(),
    },
    location: ApiLocationLink {
      name: "Citadel of Ricks".to_string(),
      url: format!("{}/location/3", API),
    },
    image: format!("{}/character/avatar/{}.jpeg", API, id),
    episode: episodes
      .iter()
      .map(|e| format!("{}/episode/{}", API, e))
      .collect(),
    location_preview: None,
  }
}

pub fn api_episode(id: i64) -> ApiEpisode {
  ApiEpisode {
    id,
    name: format!("Episode {}", id),
    air_date: "December 2, 2013".to_string(),
    episode: format!("S01E{:02}", id),
  }
}

pub fn page_url(page: i64) -> String {
  format!("{}/character/?page={}", API, page)
}

/// Remote source backed by in-memory maps, counting every call.
#[derive(Default)]
pub struct FakeRemote {
  pages: HashMap<i64, ApiCharacterPage>,
  characters: HashMap<i64, ApiCharacter>,
  episodes: HashMap<i64, ApiEpisode>,
  locations: HashMap<i64, ApiLocation>,
  latency: Duration,
  pub fail_lists: AtomicBool,
  pub requested_pages: Mutex<Vec<i64>>,
  pub character_calls: AtomicUsize,
  pub character_batch_calls: AtomicUsize,
  pub episode_calls: AtomicUsize,
  pub episode_batch_calls: AtomicUsize,
  pub location_calls: AtomicUsize,
}

impl FakeRemote {
  pub fn new() -> Self {
    Self::default()
  }

  /// Serve `ids` as listing page `page`, pointing at `next`.
  pub fn with_page(mut self, page: i64, ids: std::ops::RangeInclusive<i64>, next: Option<&str>) -> Self {
    let results = ids.map(|id| api_character(id, &[1])).collect();
    self.pages.insert(
      page,
      ApiCharacterPage {
        info: ApiPageInfo {
          count: 0,
          pages: 0,
          next: next.map(String::from),
          prev: None,
        },
        results,
      },
    );
    self
  }

  pub fn with_character(mut self, character: ApiCharacter) -> Self {
    self.characters.insert(character.id, character);
    self
  }

  pub fn with_episodes(mut self, ids: &[i64]) -> Self {
    for id in ids {
      self.episodes.insert(*id, api_episode(*id));
    }
    self
  }

  pub fn with_location(mut self, location: ApiLocation) -> Self {
    self.locations.insert(location.id, location);
    self
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  pub fn list_calls(&self) -> usize {
    self.requested_pages.lock().unwrap().len()
  }

  async fn wait(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }
}

fn unavailable(path: String) -> RemoteError {
  RemoteError::Status {
    status: 503,
    url: format!("{}/{}", API, path),
  }
}

#[async_trait]
impl RemoteSource for FakeRemote {
  async fn list_characters(&self, page: i64) -> Result<ApiCharacterPage, RemoteError> {
    self.requested_pages.lock().unwrap().push(page);
    self.wait().await;

    if self.fail_lists.load(Ordering::SeqCst) {
      return Err(unavailable(format!("character/?page={}", page)));
    }
    self
      .pages
      .get(&page)
      .cloned()
      .ok_or_else(|| unavailable(format!("character/?page={}", page)))
  }

  async fn get_character_by_id(&self, id: i64) -> Result<Option<ApiCharacter>, RemoteError> {
    self.character_calls.fetch_add(1, Ordering::SeqCst);
    self.wait().await;
    Ok(self.characters.get(&id).cloned())
  }

  async fn get_characters_by_ids(&self, ids: &[i64]) -> Result<Vec<ApiCharacter>, RemoteError> {
    self.character_batch_calls.fetch_add(1, Ordering::SeqCst);
    Ok(
      ids
        .iter()
        .filter_map(|id| self.characters.get(id).cloned())
        .collect(),
    )
  }

  async fn get_episode_by_id(&self, id: i64) -> Result<Option<ApiEpisode>, RemoteError> {
    self.episode_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.episodes.get(&id).cloned())
  }

  async fn get_episodes_by_ids(&self, ids: &[i64]) -> Result<Vec<ApiEpisode>, RemoteError> {
    self.episode_batch_calls.fetch_add(1, Ordering::SeqCst);
    // Like the real API: ascending id order regardless of request order
    let mut found: Vec<ApiEpisode> = ids
      .iter()
      .filter_map(|id| self.episodes.get(id).cloned())
      .collect();
    found.sort_by_key(|e| e.id);
    Ok(found)
  }

  async fn get_location_by_id(&self, id: i64) -> Result<Option<ApiLocation>, RemoteError> {
    self.location_calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.locations.get(&id).cloned())
  }
}
