//! Remote source abstraction consumed by the repositories.

use async_trait::async_trait;

use super::api_types::{ApiCharacter, ApiCharacterPage, ApiEpisode, ApiLocation};
use super::error::RemoteError;

/// Read access to the remote API.
///
/// Single-entity lookups return `Ok(None)` when the API reports the entity
/// as missing; every other failure is a `RemoteError`.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// Fetch one page of the character listing (pages start at 1).
  async fn list_characters(&self, page: i64) -> Result<ApiCharacterPage, RemoteError>;

  async fn get_character_by_id(&self, id: i64) -> Result<Option<ApiCharacter>, RemoteError>;

  /// Fetch several characters in one request.
  async fn get_characters_by_ids(&self, ids: &[i64]) -> Result<Vec<ApiCharacter>, RemoteError>;

  async fn get_episode_by_id(&self, id: i64) -> Result<Option<ApiEpisode>, RemoteError>;

  /// Fetch several episodes in one request.
  async fn get_episodes_by_ids(&self, ids: &[i64]) -> Result<Vec<ApiEpisode>, RemoteError>;

  async fn get_location_by_id(&self, id: i64) -> Result<Option<ApiLocation>, RemoteError>;
}
