use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::config::ApiConfig;
use crate::rm::api_types::{ApiCharacter, ApiCharacterPage, ApiEpisode, ApiLocation, OneOrMany};
use crate::rm::error::RemoteError;
use crate::rm::source::RemoteSource;

/// Rick and Morty API client
#[derive(Clone)]
pub struct RickMortyClient {
  http: reqwest::Client,
  base_url: Url,
}

impl RickMortyClient {
  pub fn new(config: &ApiConfig) -> Result<Self, RemoteError> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("rmdex/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      base_url: base_url(&config.base_url)?,
    })
  }

  /// Build an endpoint url below the API root
  fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
    Ok(self.base_url.join(path)?)
  }

  /// GET an endpoint, mapping 404 to `None`
  async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, RemoteError> {
    tracing::debug!(%url, "GET");
    let response = self.http.get(url.clone()).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !response.status().is_success() {
      return Err(RemoteError::Status {
        status: response.status().as_u16(),
        url: url.to_string(),
      });
    }

    let body = response.bytes().await?;
    Ok(Some(serde_json::from_slice(&body)?))
  }

  /// GET an endpoint that must exist
  async fn get_required<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
    let display = url.to_string();
    self
      .get_optional(url)
      .await?
      .ok_or(RemoteError::Status {
        status: StatusCode::NOT_FOUND.as_u16(),
        url: display,
      })
  }
}

/// Normalise the configured root so that relative joins append to it.
fn base_url(raw: &str) -> Result<Url, RemoteError> {
  let mut url = Url::parse(raw)?;
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}

fn join_ids(ids: &[i64]) -> String {
  ids
    .iter()
    .map(|id| id.to_string())
    .collect::<Vec<_>>()
    .join(",")
}

#[async_trait]
impl RemoteSource for RickMortyClient {
  async fn list_characters(&self, page: i64) -> Result<ApiCharacterPage, RemoteError> {
    let mut url = self.endpoint("character")?;
    url.query_pairs_mut().append_pair("page", &page.to_string());
    self.get_required(url).await
  }

  async fn get_character_by_id(&self, id: i64) -> Result<Option<ApiCharacter>, RemoteError> {
    let url = self.endpoint(&format!("character/{}", id))?;
    self.get_optional(url).await
  }

  async fn get_characters_by_ids(&self, ids: &[i64]) -> Result<Vec<ApiCharacter>, RemoteError> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let url = self.endpoint(&format!("character/{}", join_ids(ids)))?;
    let found: Option<OneOrMany<ApiCharacter>> = self.get_optional(url).await?;
    Ok(found.map(OneOrMany::into_vec).unwrap_or_default())
  }

  async fn get_episode_by_id(&self, id: i64) -> Result<Option<ApiEpisode>, RemoteError> {
    let url = self.endpoint(&format!("episode/{}", id))?;
    self.get_optional(url).await
  }

  async fn get_episodes_by_ids(&self, ids: &[i64]) -> Result<Vec<ApiEpisode>, RemoteError> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let url = self.endpoint(&format!("episode/{}", join_ids(ids)))?;
    let found: Option<OneOrMany<ApiEpisode>> = self.get_optional(url).await?;
    Ok(found.map(OneOrMany::into_vec).unwrap_or_default())
  }

  async fn get_location_by_id(&self, id: i64) -> Result<Option<ApiLocation>, RemoteError> {
    let url = self.endpoint(&format!("location/{}", id))?;
    self.get_optional(url).await
  }
}
