//! Serde-deserializable types matching Rick and Morty API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::record::{CharacterRecord, EpisodeIds};
use super::types::{
  Character, CharacterGender, CharacterStatus, Episode, Location, LocationPreview, LocationRef,
};

/// Extract the trailing numeric id of an API resource url
/// (`https://rickandmortyapi.com/api/location/3` -> `3`).
pub fn id_from_url(url: &str) -> Option<i64> {
  url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// Multi-id endpoints answer with a bare object when only one id resolves.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  Many(Vec<T>),
  One(T),
}

impl<T> OneOrMany<T> {
  pub fn into_vec(self) -> Vec<T> {
    match self {
      Self::Many(items) => items,
      Self::One(item) => vec![item],
    }
  }
}

// ============================================================================
// Characters
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLocationLink {
  pub name: String,
  #[serde(default)]
  pub url: String,
}

impl ApiLocationLink {
  fn into_ref(self) -> LocationRef {
    LocationRef {
      id: id_from_url(&self.url),
      name: self.name,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLocationPreview {
  pub id: i64,
  pub name: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub dimension: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCharacter {
  pub id: i64,
  pub name: String,
  pub status: String,
  pub species: String,
  #[serde(rename = "type", default)]
  pub kind: String,
  pub gender: String,
  pub origin: ApiLocationLink,
  pub location: ApiLocationLink,
  pub image: String,
  #[serde(default)]
  pub episode: Vec<String>,
  #[serde(rename = "locationPreview", default)]
  pub location_preview: Option<ApiLocationPreview>,
}

impl ApiCharacter {
  /// Map to a cache row stamped with `cached_at`.
  pub fn into_record(self, cached_at: DateTime<Utc>) -> CharacterRecord {
    let episode_ids = self
      .episode
      .iter()
      .filter_map(|url| id_from_url(url))
      .collect();

    CharacterRecord {
      id: self.id,
      status: CharacterStatus::from_raw(&self.status),
      gender: CharacterGender::from_raw(&self.gender),
      name: self.name,
      species: self.species,
      kind: self.kind,
      origin: self.origin.into_ref(),
      location: self.location.into_ref(),
      avatar_url: self.image,
      episode_ids: EpisodeIds::new(episode_ids),
      location_preview: self.location_preview.map(|p| LocationPreview {
        id: p.id,
        name: p.name,
        kind: p.kind,
        dimension: p.dimension,
      }),
      cached_at,
    }
  }

  pub fn into_model(self) -> Character {
    self.into_record(Utc::now()).to_model()
  }
}

/// Pagination block of list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPageInfo {
  #[serde(default)]
  pub count: u64,
  #[serde(default)]
  pub pages: u64,
  pub next: Option<String>,
  pub prev: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCharacterPage {
  pub info: ApiPageInfo,
  #[serde(default)]
  pub results: Vec<ApiCharacter>,
}

// ============================================================================
// Episodes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEpisode {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub air_date: String,
  #[serde(default)]
  pub episode: String,
}

impl From<ApiEpisode> for Episode {
  fn from(e: ApiEpisode) -> Self {
    Episode {
      id: e.id,
      name: e.name,
      air_date: e.air_date,
      code: e.episode,
    }
  }
}

// ============================================================================
// Locations
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLocation {
  pub id: i64,
  pub name: String,
  #[serde(rename = "type", default)]
  pub kind: String,
  #[serde(default)]
  pub dimension: String,
  #[serde(default)]
  pub residents: Vec<String>,
}

impl ApiLocation {
  pub fn resident_ids(&self) -> Vec<i64> {
    self
      .residents
      .iter()
      .filter_map(|url| id_from_url(url))
      .collect()
  }

  pub fn into_model(self, residents: Vec<Character>) -> Location {
    Location {
      id: self.id,
      name: self.name,
      kind: self.kind,
      dimension: self.dimension,
      residents,
    }
  }
}
