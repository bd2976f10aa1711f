use std::sync::Arc;
use tracing::debug;

use super::api_types::ApiCharacter;
use super::error::{RepositoryError, RepositoryResult};
use super::source::RemoteSource;
use super::types::Location;

/// Location lookups. Always remote; locations are not cached.
pub struct LocationRepository<R: RemoteSource> {
  remote: Arc<R>,
}

impl<R: RemoteSource> LocationRepository<R> {
  pub fn new(remote: Arc<R>) -> Self {
    Self { remote }
  }

  /// Fetch a location and the characters residing in it.
  pub async fn get_location(&self, id: i64) -> RepositoryResult<Location> {
    let location = self
      .remote
      .get_location_by_id(id)
      .await?
      .ok_or(RepositoryError::LocationNotFound(id))?;

    let resident_ids = location.resident_ids();
    debug!(id, residents = resident_ids.len(), "resolving location residents");

    let residents = if resident_ids.is_empty() {
      Vec::new()
    } else {
      self
        .remote
        .get_characters_by_ids(&resident_ids)
        .await?
        .into_iter()
        .map(ApiCharacter::into_model)
        .collect()
    };

    Ok(location.into_model(residents))
  }
}

impl<R: RemoteSource> Clone for LocationRepository<R> {
  fn clone(&self) -> Self {
    Self {
      remote: Arc::clone(&self.remote),
    }
  }
}
