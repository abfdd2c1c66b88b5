use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::{StoreError, TermStore};
use crate::models::{Settings, TermEvent, TermKind};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS terms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    kind TEXT NOT NULL,
    languages TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_terms_kind_created ON terms(kind, created_at);
CREATE INDEX IF NOT EXISTS idx_terms_created ON terms(created_at);
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    json TEXT NOT NULL
);
"#;

/// SQLite-backed [`TermStore`]. Timestamps are stored as Unix millis.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::with_connection(conn)
    }

    /// In-memory store, used in tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn count_terms(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM terms", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn encode_languages(languages: &BTreeSet<String>) -> String {
    languages.iter().cloned().collect::<Vec<_>>().join(",")
}

fn decode_languages(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}

impl TermStore for SqliteStore {
    fn insert(&self, event: &TermEvent) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO terms (text, kind, languages, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.text,
                event.kind.as_str(),
                encode_languages(&event.languages),
                event.created_at.timestamp_millis()
            ],
        )?;
        Ok(())
    }

    fn query(&self, kind: TermKind, since: DateTime<Utc>) -> Result<Vec<TermEvent>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT text, kind, languages, created_at
             FROM terms
             WHERE kind = ?1 AND created_at >= ?2
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map(params![kind.as_str(), since.timestamp_millis()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(text, kind, languages, created_at)| {
                let kind = kind
                    .parse::<TermKind>()
                    .map_err(|_| StoreError::InvalidKind(kind))?;
                let created_at = DateTime::<Utc>::from_timestamp_millis(created_at)
                    .ok_or(StoreError::InvalidTimestamp(created_at))?;
                Ok(TermEvent {
                    text,
                    kind,
                    languages: decode_languages(&languages),
                    created_at,
                })
            })
            .collect()
    }

    fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let deleted = conn.execute(
            "DELETE FROM terms WHERE created_at < ?1",
            params![cutoff.timestamp_millis()],
        )?;
        Ok(deleted)
    }

    fn load_settings(&self) -> Result<Settings, StoreError> {
        let conn = self.conn.lock();
        let stored: Option<String> = conn
            .query_row("SELECT json FROM settings WHERE id = 1", [], |row| row.get(0))
            .optional()?;

        match stored {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => {
                let settings = Settings::default();
                conn.execute(
                    "INSERT OR IGNORE INTO settings (id, json) VALUES (1, ?1)",
                    params![serde_json::to_string(&settings)?],
                )?;
                tracing::info!("Created default settings row");
                Ok(settings)
            }
        }
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let json = serde_json::to_string(settings)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO settings (id, json) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET json = excluded.json",
            params![json],
        )?;
        Ok(())
    }
}
