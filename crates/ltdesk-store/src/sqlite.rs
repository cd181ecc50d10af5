use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, Utc};
use ltdesk_core::store::{SettingsStore, StoreError};
use ltdesk_types::{Credentials, HistoryEntry, StoredLanguage, StoredPair};
use rusqlite::{Connection, OptionalExtension, params};

/// Same layout SQLite uses for `CURRENT_TIMESTAMP`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS api_settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    api_url TEXT NOT NULL,
    api_key TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS language_settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    left_language TEXT NOT NULL,
    right_language TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS translation_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_language TEXT NOT NULL,
    target_language TEXT NOT NULL,
    input_text TEXT NOT NULL,
    output_text TEXT NOT NULL,
    timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

/// File-backed settings and history.
///
/// All three tables are append-only; the "current" row of a settings table
/// is the one with the highest id. One connection behind a mutex keeps
/// writes serialized.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

fn backend(error: rusqlite::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{raw}': {e}")))
}

impl SqliteStore {
    /// Open or create the database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Opened settings database at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.db
            .lock()
            .map_err(|_| StoreError::Backend("Failed to lock database".to_string()))
    }
}

impl SettingsStore for SqliteStore {
    fn load_language_pair(&self) -> Result<Option<StoredPair>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT left_language, right_language FROM language_settings
                 ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(backend)?;

        Ok(row.map(|(left, right)| StoredPair {
            left: StoredLanguage::parse(&left),
            right: StoredLanguage::parse(&right),
        }))
    }

    fn save_language_pair(&self, pair: &StoredPair) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO language_settings (left_language, right_language) VALUES (?1, ?2)",
            params![pair.left.to_column(), pair.right.to_column()],
        )
        .map_err(backend)?;
        Ok(())
    }

    fn load_api_credentials(&self) -> Result<Option<Credentials>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT api_url, api_key FROM api_settings ORDER BY id DESC LIMIT 1",
            [],
            |row| {
                Ok(Credentials {
                    url: row.get(0)?,
                    key: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(backend)
    }

    fn save_api_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO api_settings (api_url, api_key) VALUES (?1, ?2)",
            params![credentials.url, credentials.key],
        )
        .map_err(backend)?;
        Ok(())
    }

    fn append_history(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO translation_history
                (source_language, target_language, input_text, output_text, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.source_language,
                entry.target_language,
                entry.input_text,
                entry.output_text,
                format_timestamp(&entry.timestamp),
            ],
        )
        .map_err(backend)?;
        Ok(())
    }

    fn load_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT source_language, target_language, input_text, output_text, timestamp
                 FROM translation_history
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1",
            )
            .map_err(backend)?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(backend)?;

        let mut entries = Vec::new();
        for row in rows {
            let (source_language, target_language, input_text, output_text, timestamp) =
                row.map_err(backend)?;
            entries.push(HistoryEntry {
                source_language,
                target_language,
                input_text,
                output_text,
                timestamp: parse_timestamp(&timestamp)?,
            });
        }
        Ok(entries)
    }

    fn clear_history(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM translation_history", [])
            .map_err(backend)?;
        tracing::debug!("Removed {} history entries", removed);
        Ok(())
    }
}
