//! Record store trait and SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use super::traits::Record;

/// Failures raised by the local record store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("sqlite failure: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("record serialization failed: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("store directory could not be created: {0}")]
  Io(#[from] std::io::Error),

  #[error("could not determine a data directory")]
  NoDataDir,

  #[error("store lock poisoned")]
  Poisoned,

  #[error("record has no identifier")]
  MissingId,
}

/// Trait for local record store backends.
///
/// Writes are unconditional replace-by-identifier; `replace_all` swaps the
/// full extent of one entity kind in a single transaction so readers never
/// observe a half-applied listing.
pub trait RecordStore: Send + Sync {
  /// All stored records of this kind, in listing order.
  fn list_all<T: Record>(&self) -> Result<Vec<T>, StoreError>;

  /// A single record by identifier.
  fn get_by_id<T: Record>(&self, id: i64) -> Result<Option<T>, StoreError>;

  /// Insert or replace one record by identifier.
  fn upsert_one<T: Record>(&self, record: &T) -> Result<(), StoreError>;

  /// Atomically replace the full extent of this kind with `records`.
  fn replace_all<T: Record>(&self, records: &[T]) -> Result<(), StoreError>;

  /// Remove one record by identifier. Removing an absent record is fine.
  fn evict<T: Record>(&self, id: i64) -> Result<(), StoreError>;

  /// Next free negative placeholder identifier for this kind.
  fn allocate_placeholder<T: Record>(&self) -> Result<i64, StoreError>;

  /// Rewrite a placeholder row to the backend-confirmed record, keeping its
  /// listing position. Falls back to a plain upsert when the placeholder
  /// row is gone.
  fn promote<T: Record>(&self, placeholder: i64, record: &T) -> Result<(), StoreError>;
}

/// SQLite-based record store implementation.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self, StoreError> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create the store at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self, StoreError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// In-memory store for tests.
  #[cfg(test)]
  pub fn in_memory() -> Result<Self, StoreError> {
    let conn = Connection::open_in_memory()?;
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(StoreError::NoDataDir)?;

    Ok(data_dir.join("raidsync").join("records.db"))
  }

  /// Run database migrations for the records table.
  fn run_migrations(&self) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn.execute_batch(STORE_SCHEMA)?;
    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::Poisoned)
  }
}

/// Schema for the record store.
const STORE_SCHEMA: &str = r#"
-- Generic record store (serialized JSON, one row per record)
CREATE TABLE IF NOT EXISTS records (
    kind TEXT NOT NULL,
    id INTEGER NOT NULL,
    data BLOB NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (kind, id)
);

CREATE INDEX IF NOT EXISTS idx_records_kind_position
    ON records(kind, position);
"#;

impl RecordStore for SqliteStore {
  fn list_all<T: Record>(&self) -> Result<Vec<T>, StoreError> {
    let conn = self.lock()?;

    let mut stmt = conn.prepare("SELECT data FROM records WHERE kind = ?1 ORDER BY position, id")?;
    let rows = stmt.query_map(params![T::kind()], |row| row.get::<_, Vec<u8>>(0))?;

    let mut records = Vec::new();
    for data in rows {
      records.push(serde_json::from_slice(&data?)?);
    }

    Ok(records)
  }

  fn get_by_id<T: Record>(&self, id: i64) -> Result<Option<T>, StoreError> {
    let conn = self.lock()?;

    let data: Option<Vec<u8>> = conn
      .query_row(
        "SELECT data FROM records WHERE kind = ?1 AND id = ?2",
        params![T::kind(), id],
        |row| row.get(0),
      )
      .optional()?;

    match data {
      Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
      None => Ok(None),
    }
  }

  fn upsert_one<T: Record>(&self, record: &T) -> Result<(), StoreError> {
    let id = record.record_id().ok_or(StoreError::MissingId)?;
    let data = serde_json::to_vec(record)?;
    let conn = self.lock()?;

    // New rows append at the end of the listing; replaced rows keep their
    // position.
    conn.execute(
      "INSERT INTO records (kind, id, data, position, cached_at)
       VALUES (?1, ?2, ?3,
               (SELECT COALESCE(MAX(position), -1) + 1 FROM records WHERE kind = ?1),
               datetime('now'))
       ON CONFLICT (kind, id) DO UPDATE SET data = excluded.data, cached_at = excluded.cached_at",
      params![T::kind(), id, data],
    )?;

    Ok(())
  }

  fn replace_all<T: Record>(&self, records: &[T]) -> Result<(), StoreError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM records WHERE kind = ?1", params![T::kind()])?;

    for (position, record) in records.iter().enumerate() {
      let id = record.record_id().ok_or(StoreError::MissingId)?;
      let data = serde_json::to_vec(record)?;

      tx.execute(
        "INSERT OR REPLACE INTO records (kind, id, data, position, cached_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))",
        params![T::kind(), id, data, position as i64],
      )?;
    }

    tx.commit()?;
    Ok(())
  }

  fn evict<T: Record>(&self, id: i64) -> Result<(), StoreError> {
    let conn = self.lock()?;

    conn.execute(
      "DELETE FROM records WHERE kind = ?1 AND id = ?2",
      params![T::kind(), id],
    )?;

    Ok(())
  }

  fn allocate_placeholder<T: Record>(&self) -> Result<i64, StoreError> {
    let conn = self.lock()?;

    let lowest: Option<i64> = conn.query_row(
      "SELECT MIN(id) FROM records WHERE kind = ?1 AND id < 0",
      params![T::kind()],
      |row| row.get(0),
    )?;

    Ok(lowest.map_or(-1, |id| id - 1))
  }

  fn promote<T: Record>(&self, placeholder: i64, record: &T) -> Result<(), StoreError> {
    let id = record.record_id().ok_or(StoreError::MissingId)?;
    let data = serde_json::to_vec(record)?;

    let rewritten = {
      let conn = self.lock()?;
      conn.execute(
        "UPDATE OR REPLACE records SET id = ?1, data = ?2, cached_at = datetime('now')
         WHERE kind = ?3 AND id = ?4",
        params![id, data, T::kind(), placeholder],
      )?
    };

    // The placeholder row can be gone (evicted, or the extent was replaced
    // in the meantime); the confirmed copy still belongs in the store.
    if rewritten == 0 {
      self.upsert_one(record)?;
    }

    Ok(())
  }
}
