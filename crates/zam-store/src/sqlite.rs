//! SQLite store: connection lifecycle and schema migrations.

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, info};

use crate::StoreError;

const LATEST_SCHEMA_VERSION: i64 = 1;

const CREATE_SCHEMA_MIGRATIONS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at TEXT NOT NULL
);
";

const MIGRATION_001_SQL: &str = r"
CREATE TABLE IF NOT EXISTS lectures (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  chambre TEXT NOT NULL CHECK (chambre IN ('an','senat')),
  type_texte TEXT NOT NULL CHECK (type_texte IN ('projet','proposition')),
  numero INTEGER NOT NULL,
  legislature INTEGER,
  session TEXT,
  session_key TEXT NOT NULL,
  titre_long TEXT NOT NULL DEFAULT '',
  organe TEXT NOT NULL,
  partie INTEGER NOT NULL DEFAULT 0,
  titre TEXT NOT NULL DEFAULT '',
  UNIQUE (chambre, session_key, numero, organe, partie)
);

CREATE TABLE IF NOT EXISTS articles (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  lecture_id INTEGER NOT NULL,
  type TEXT NOT NULL,
  num TEXT NOT NULL DEFAULT '',
  mult TEXT NOT NULL DEFAULT '',
  pos TEXT NOT NULL DEFAULT '',
  content_json TEXT NOT NULL DEFAULT '{}',
  title TEXT NOT NULL DEFAULT '',
  presentation TEXT NOT NULL DEFAULT '',
  UNIQUE (lecture_id, type, num, mult, pos),
  FOREIGN KEY (lecture_id) REFERENCES lectures(id)
);

CREATE TABLE IF NOT EXISTS users (
  email TEXT PRIMARY KEY,
  name TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS batches (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS amendements (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  lecture_id INTEGER NOT NULL,
  num INTEGER NOT NULL,
  rectif INTEGER NOT NULL DEFAULT 0,
  article_id INTEGER,
  parent_id INTEGER,
  position INTEGER,
  id_discussion_commune INTEGER,
  id_identique INTEGER,
  matricule TEXT,
  auteur TEXT NOT NULL DEFAULT '',
  groupe TEXT NOT NULL DEFAULT '',
  alinea TEXT NOT NULL DEFAULT '',
  date_depot TEXT,
  sort TEXT NOT NULL DEFAULT '',
  corps TEXT NOT NULL DEFAULT '',
  expose TEXT NOT NULL DEFAULT '',
  mission_titre TEXT,
  mission_titre_court TEXT,
  batch_id INTEGER,
  avis TEXT NOT NULL DEFAULT '',
  objet TEXT NOT NULL DEFAULT '',
  reponse TEXT NOT NULL DEFAULT '',
  comments TEXT NOT NULL DEFAULT '',
  user_table TEXT,
  shared_table TEXT,
  UNIQUE (lecture_id, num),
  UNIQUE (lecture_id, position),
  FOREIGN KEY (lecture_id) REFERENCES lectures(id),
  FOREIGN KEY (article_id) REFERENCES articles(id),
  FOREIGN KEY (parent_id) REFERENCES amendements(id),
  FOREIGN KEY (batch_id) REFERENCES batches(id),
  FOREIGN KEY (user_table) REFERENCES users(email)
);

CREATE INDEX IF NOT EXISTS idx_amendements_batch ON amendements(batch_id);

CREATE TABLE IF NOT EXISTS events (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  kind TEXT NOT NULL,
  created_at TEXT NOT NULL,
  user_email TEXT,
  user_name TEXT,
  subject_type TEXT NOT NULL CHECK (subject_type IN ('lecture','article','amendement')),
  subject_id INTEGER NOT NULL,
  payload_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_subject ON events(subject_type, subject_id);
";

/// SQLite store for lectures, articles, amendements, batches and events.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage. Both apply pending migrations.
///
/// Repository functions in this crate take a `&Connection`; a
/// [`Transaction`] derefs to one, so the same functions run inside a
/// synchronization run's transaction.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open an in-memory database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Open or create a persistent database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        info!(path = %path.display(), "opened sqlite store");
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Apply all forward migrations up to the latest schema version.
    pub fn migrate(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(CREATE_SCHEMA_MIGRATIONS_SQL)?;
        let version = self.schema_version()?;
        if version > LATEST_SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: version,
                expected: LATEST_SCHEMA_VERSION,
            });
        }
        if version < 1 {
            let tx = self.conn.transaction()?;
            tx.execute_batch(MIGRATION_001_SQL)?;
            tx.execute(
                "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
                params![1_i64, Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            debug!(version = 1, "applied migration");
        }
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i64, StoreError> {
        let version: Option<i64> = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(version.unwrap_or(0))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Start a transaction; dropped without `commit()` it rolls back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self.conn.transaction()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_migrates() {
        let store = SqliteStore::open().unwrap();
        assert_eq!(store.schema_version().unwrap(), LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let mut store = SqliteStore::open().unwrap();
        store.migrate().unwrap();
        store.migrate().unwrap();
        assert_eq!(store.schema_version().unwrap(), 1);
    }

    #[test]
    fn open_persistent_creates_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("zam.sqlite");
        assert!(!db_path.exists());

        let store = SqliteStore::open_persistent(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(store.schema_version().unwrap(), 1);
    }

    #[test]
    fn persistent_reopen_keeps_schema() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("zam.sqlite");
        let store = SqliteStore::open_persistent(&db_path).unwrap();
        store
            .conn()
            .execute("INSERT INTO users(email, name) VALUES ('a@b.c', 'A')", [])
            .unwrap();
        drop(store);

        let store = SqliteStore::open_persistent(&db_path).unwrap();
        let count: i64 = store
            .conn()
            .query_row("SELECT count(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
