//! SQLite implementation of the character store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

use super::traits::{CharacterStore, PageCursor, StoreError, StoreResult};
use crate::rm::record::{CharacterRecord, EpisodeIds};
use crate::rm::types::{CharacterGender, CharacterStatus, LocationPreview, LocationRef};

/// Preference key holding the next character page to load.
const NEXT_PAGE_KEY: &str = "next_characters_page_to_load";

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Cached characters. `seq` preserves insertion order across overwrites.
CREATE TABLE IF NOT EXISTS characters (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    status TEXT NOT NULL,
    species TEXT NOT NULL,
    kind TEXT NOT NULL,
    gender TEXT NOT NULL,
    origin_name TEXT NOT NULL,
    origin_id INTEGER,
    location_name TEXT NOT NULL,
    location_id INTEGER,
    avatar_url TEXT NOT NULL,
    episode_ids TEXT NOT NULL,
    location_preview TEXT,
    cached_at TEXT NOT NULL
);

-- Small durable key/value state (pagination cursor)
CREATE TABLE IF NOT EXISTS preferences (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
"#;

const SELECT_COLUMNS: &str = "id, name, status, species, kind, gender, origin_name, origin_id,
   location_name, location_id, avatar_url, episode_ids, location_preview, cached_at";

const UPSERT_CHARACTER: &str = "INSERT INTO characters (id, name, status, species, kind, gender,
     origin_name, origin_id, location_name, location_id, avatar_url, episode_ids,
     location_preview, cached_at)
   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
   ON CONFLICT(id) DO UPDATE SET
     name = excluded.name,
     status = excluded.status,
     species = excluded.species,
     kind = excluded.kind,
     gender = excluded.gender,
     origin_name = excluded.origin_name,
     origin_id = excluded.origin_id,
     location_name = excluded.location_name,
     location_id = excluded.location_id,
     avatar_url = excluded.avatar_url,
     episode_ids = excluded.episode_ids,
     location_preview = excluded.location_preview,
     cached_at = excluded.cached_at";

/// SQLite-based character store.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
  version: watch::Sender<u64>,
}

impl SqliteStorage {
  /// Open or create the store at the given path.
  pub fn open(path: &Path) -> StoreResult<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    tracing::debug!(path = %path.display(), "opening character cache");
    Self::with_connection(Connection::open(path)?)
  }

  /// Open a throwaway store that lives as long as the value.
  pub fn open_in_memory() -> StoreResult<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  /// Get the default database path.
  pub fn default_path() -> Option<PathBuf> {
    let data_dir = dirs::data_dir().or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))?;
    Some(data_dir.join("rmdex").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> StoreResult<Self> {
    conn.execute_batch(CACHE_SCHEMA)?;
    let (version, _) = watch::channel(0);

    Ok(Self {
      conn: Mutex::new(conn),
      version,
    })
  }

  fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| StoreError::LockPoisoned(e.to_string()))
  }

  fn notify(&self) {
    self.version.send_modify(|v| *v += 1);
  }

  #[cfg(test)]
  pub(crate) fn raw_connection(&self) -> MutexGuard<'_, Connection> {
    self.conn.lock().unwrap()
  }
}

fn upsert_in(tx: &Transaction<'_>, record: &CharacterRecord) -> StoreResult<()> {
  let preview = record
    .location_preview
    .as_ref()
    .map(serde_json::to_string)
    .transpose()?;

  tx.execute(
    UPSERT_CHARACTER,
    params![
      record.id,
      record.name,
      record.status.as_str(),
      record.species,
      record.kind,
      record.gender.as_str(),
      record.origin.name,
      record.origin.id,
      record.location.name,
      record.location.id,
      record.avatar_url,
      record.episode_ids.encode(),
      preview,
      record.cached_at.to_rfc3339(),
    ],
  )?;

  Ok(())
}

fn write_cursor_in(conn: &Connection, cursor: PageCursor) -> StoreResult<()> {
  conn.execute(
    "INSERT INTO preferences (name, value) VALUES (?1, ?2)
     ON CONFLICT(name) DO UPDATE SET value = excluded.value",
    params![NEXT_PAGE_KEY, cursor.to_stored()],
  )?;
  Ok(())
}

/// Raw column values of one `characters` row.
struct StoredRow {
  id: i64,
  name: String,
  status: String,
  species: String,
  kind: String,
  gender: String,
  origin_name: String,
  origin_id: Option<i64>,
  location_name: String,
  location_id: Option<i64>,
  avatar_url: String,
  episode_ids: String,
  location_preview: Option<String>,
  cached_at: String,
}

impl StoredRow {
  fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get(0)?,
      name: row.get(1)?,
      status: row.get(2)?,
      species: row.get(3)?,
      kind: row.get(4)?,
      gender: row.get(5)?,
      origin_name: row.get(6)?,
      origin_id: row.get(7)?,
      location_name: row.get(8)?,
      location_id: row.get(9)?,
      avatar_url: row.get(10)?,
      episode_ids: row.get(11)?,
      location_preview: row.get(12)?,
      cached_at: row.get(13)?,
    })
  }

  fn into_record(self) -> StoreResult<CharacterRecord> {
    let id = self.id;
    let episode_ids = EpisodeIds::decode(&self.episode_ids).map_err(|e| StoreError::Corrupt {
      id,
      reason: e.to_string(),
    })?;
    let location_preview: Option<LocationPreview> = self
      .location_preview
      .as_deref()
      .map(serde_json::from_str)
      .transpose()?;

    Ok(CharacterRecord {
      id,
      name: self.name,
      status: CharacterStatus::from_raw(&self.status),
      species: self.species,
      kind: self.kind,
      gender: CharacterGender::from_raw(&self.gender),
      origin: LocationRef {
        name: self.origin_name,
        id: self.origin_id,
      },
      location: LocationRef {
        name: self.location_name,
        id: self.location_id,
      },
      avatar_url: self.avatar_url,
      episode_ids,
      location_preview,
      cached_at: parse_datetime(id, &self.cached_at)?,
    })
  }
}

/// Parse a stored RFC 3339 timestamp.
fn parse_datetime(id: i64, s: &str) -> StoreResult<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StoreError::Corrupt {
      id,
      reason: format!("bad cached_at '{}': {}", s, e),
    })
}

impl CharacterStore for SqliteStorage {
  fn subscribe(&self) -> watch::Receiver<u64> {
    self.version.subscribe()
  }

  fn all(&self) -> StoreResult<Vec<CharacterRecord>> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM characters ORDER BY seq",
      SELECT_COLUMNS
    ))?;

    let rows = stmt
      .query_map([], StoredRow::read)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(StoredRow::into_record).collect()
  }

  fn is_empty(&self) -> StoreResult<bool> {
    let conn = self.lock()?;
    let any: bool = conn.query_row("SELECT EXISTS(SELECT 1 FROM characters)", [], |row| row.get(0))?;
    Ok(!any)
  }

  fn get_by_id(&self, id: i64) -> StoreResult<Option<CharacterRecord>> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(&format!(
      "SELECT {} FROM characters WHERE id = ?1",
      SELECT_COLUMNS
    ))?;

    let row = stmt.query_row(params![id], StoredRow::read).optional()?;
    row.map(StoredRow::into_record).transpose()
  }

  fn upsert(&self, record: &CharacterRecord) -> StoreResult<()> {
    self.upsert_batch(std::slice::from_ref(record))
  }

  fn upsert_batch(&self, records: &[CharacterRecord]) -> StoreResult<()> {
    {
      let mut conn = self.lock()?;
      let tx = conn.transaction()?;
      for record in records {
        upsert_in(&tx, record)?;
      }
      tx.commit()?;
    }

    self.notify();
    Ok(())
  }

  fn read_cursor(&self) -> StoreResult<PageCursor> {
    let conn = self.lock()?;
    let stored: Option<i64> = conn
      .query_row(
        "SELECT value FROM preferences WHERE name = ?1",
        params![NEXT_PAGE_KEY],
        |row| row.get(0),
      )
      .optional()?;

    Ok(stored.map(PageCursor::from_stored).unwrap_or_default())
  }

  fn write_cursor(&self, cursor: PageCursor) -> StoreResult<()> {
    let conn = self.lock()?;
    write_cursor_in(&conn, cursor)
  }

  fn commit_page(&self, cursor: PageCursor, records: &[CharacterRecord]) -> StoreResult<()> {
    {
      let mut conn = self.lock()?;
      let tx = conn.transaction()?;
      write_cursor_in(&tx, cursor)?;
      for record in records {
        upsert_in(&tx, record)?;
      }
      tx.commit()?;
    }

    self.notify();
    Ok(())
  }
}
