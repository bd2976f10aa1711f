use serde::{Deserialize, Serialize};

/// Life status of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterStatus {
  Alive,
  Dead,
  Unknown,
}

impl CharacterStatus {
  /// Map a raw API value. Anything outside the known set is `Unknown`.
  pub fn from_raw(raw: &str) -> Self {
    match raw {
      "Alive" => Self::Alive,
      "Dead" => Self::Dead,
      _ => Self::Unknown,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Alive => "Alive",
      Self::Dead => "Dead",
      Self::Unknown => "unknown",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterGender {
  Female,
  Male,
  Genderless,
  Unknown,
}

impl CharacterGender {
  /// Map a raw API value. Anything outside the known set is `Unknown`.
  pub fn from_raw(raw: &str) -> Self {
    match raw {
      "Female" => Self::Female,
      "Male" => Self::Male,
      "Genderless" => Self::Genderless,
      _ => Self::Unknown,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Female => "Female",
      Self::Male => "Male",
      Self::Genderless => "Genderless",
      Self::Unknown => "unknown",
    }
  }
}

/// Named reference to a location, as embedded in a character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
  pub name: String,
  /// `None` when the API gives no resolvable location url
  pub id: Option<i64>,
}

/// Denormalised snapshot of a character's current location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPreview {
  pub id: i64,
  pub name: String,
  pub kind: String,
  pub dimension: String,
}

/// Character for list and detail views
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
  pub id: i64,
  pub name: String,
  pub status: CharacterStatus,
  pub species: String,
  pub kind: String,
  pub gender: CharacterGender,
  pub origin: LocationRef,
  pub location: LocationRef,
  pub avatar_url: String,
  pub episode_ids: Vec<i64>,
  pub location_preview: Option<LocationPreview>,
}

/// Episode summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
  pub id: i64,
  pub name: String,
  pub air_date: String,
  pub code: String, // e.g. "S01E01"
}

/// Character together with the episodes it appears in
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDetails {
  pub character: Character,
  pub episodes: Vec<Episode>,
}

/// Location with its resolved residents
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
  pub id: i64,
  pub name: String,
  pub kind: String,
  pub dimension: String,
  pub residents: Vec<Character>,
}
