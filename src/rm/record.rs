//! Cached character row and its compact episode id encoding.

use chrono::{DateTime, Utc};

use super::error::RepositoryError;
use super::types::{Character, CharacterGender, CharacterStatus, LocationPreview, LocationRef};

/// Ordered list of episode ids.
///
/// Persisted as a comma-joined string (`"1,2,3"`). A single id is stored
/// without separator and an empty list as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeIds(Vec<i64>);

impl EpisodeIds {
  pub fn new(ids: Vec<i64>) -> Self {
    Self(ids)
  }

  /// Decode the persisted form.
  ///
  /// Fails with `InvalidPrecondition` on any token that is not an integer.
  pub fn decode(encoded: &str) -> Result<Self, RepositoryError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
      return Ok(Self::default());
    }

    encoded
      .split(',')
      .map(|token| {
        token.trim().parse::<i64>().map_err(|_| {
          RepositoryError::InvalidPrecondition(format!(
            "episode id list {:?} contains non-numeric token {:?}",
            encoded, token
          ))
        })
      })
      .collect::<Result<Vec<_>, _>>()
      .map(Self)
  }

  pub fn encode(&self) -> String {
    self
      .0
      .iter()
      .map(|id| id.to_string())
      .collect::<Vec<_>>()
      .join(",")
  }

  pub fn as_slice(&self) -> &[i64] {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// A character as stored in the local cache
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRecord {
  pub id: i64,
  pub name: String,
  pub status: CharacterStatus,
  pub species: String,
  pub kind: String,
  pub gender: CharacterGender,
  pub origin: LocationRef,
  pub location: LocationRef,
  pub avatar_url: String,
  pub episode_ids: EpisodeIds,
  pub location_preview: Option<LocationPreview>,
  /// When the row was last written
  pub cached_at: DateTime<Utc>,
}

impl CharacterRecord {
  pub fn to_model(&self) -> Character {
    Character {
      id: self.id,
      name: self.name.clone(),
      status: self.status,
      species: self.species.clone(),
      kind: self.kind.clone(),
      gender: self.gender,
      origin: self.origin.clone(),
      location: self.location.clone(),
      avatar_url: self.avatar_url.clone(),
      episode_ids: self.episode_ids.as_slice().to_vec(),
      location_preview: self.location_preview.clone(),
    }
  }
}
