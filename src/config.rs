use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://rickandmortyapi.com/api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// API root, e.g. https://rickandmortyapi.com/api
  #[serde(default = "default_api_url")]
  pub base_url: String,
  /// Per-request timeout
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_api_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  10
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Cache database path (defaults to $XDG_DATA_HOME/rmdex/cache.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// tracing filter directive, overridden by RUST_LOG
  #[serde(default = "default_log_filter")]
  pub filter: String,
  /// Write logs to this file instead of stderr
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      filter: default_log_filter(),
      file: None,
    }
  }
}

fn default_log_filter() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file, falling back to defaults.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./rmdex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rmdex/config.yaml
  ///
  /// Environment overrides are applied last.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    Ok(config.with_env_overrides())
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("rmdex.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rmdex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Apply RMDEX_API_URL and RMDEX_CACHE_PATH.
  fn with_env_overrides(mut self) -> Self {
    if let Ok(url) = std::env::var("RMDEX_API_URL") {
      self.api.base_url = url;
    }
    if let Ok(path) = std::env::var("RMDEX_CACHE_PATH") {
      self.cache.path = Some(PathBuf::from(path));
    }
    self
  }

  /// Resolved cache database path.
  pub fn cache_path(&self) -> Result<PathBuf> {
    self
      .cache
      .path
      .clone()
      .or_else(crate::cache::SqliteStorage::default_path)
      .ok_or_else(|| eyre!("Could not determine data directory"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.api.base_url, DEFAULT_API_URL);
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.log.filter, "info");
    assert!(config.cache.path.is_none());
  }

  #[test]
  fn test_partial_config() {
    let config = Config::parse(
      "api:\n  base_url: http://localhost:8080/api\ncache:\n  path: /tmp/rm.db\n",
    )
    .unwrap();
    assert_eq!(config.api.base_url, "http://localhost:8080/api");
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/rm.db")));
  }

  #[test]
  fn test_load_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rmdex.yaml");
    std::fs::write(&path, "log:\n  filter: rmdex=debug\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.log.filter, "rmdex=debug");
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
  }

  #[test]
  fn test_invalid_yaml_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "api: [unclosed").unwrap();
    assert!(Config::load(Some(&path)).is_err());
  }
}
