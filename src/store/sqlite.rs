//! SQLite-backed profile store — connection wrapper and migrations.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::error::StoreError;
use crate::registration::model::{Language, ProfileRecord};

use super::ProfileStore;

/// Profile store wrapping a SQLite connection behind a Mutex.
///
/// Using `Mutex` (not `RwLock`) because rusqlite `Connection` is `!Sync`.
/// All DB access is serialized — fine for one row per registered user.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Open(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Open(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        info!(path = %path.display(), "Profile database opened");
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Get a lock on the underlying connection.
    ///
    /// Callers hold the lock for the duration of their DB operation.
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Profile store mutex poisoned")
    }

    /// Run all schema migrations. Idempotent.
    ///
    /// `is_premium` is not written by the registration flow; it defaults to 0
    /// and survives profile re-registration.
    fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                tg_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                interests TEXT NOT NULL,
                bio TEXT NOT NULL,
                photo TEXT NOT NULL,
                is_premium INTEGER NOT NULL DEFAULT 0,
                lang TEXT NOT NULL DEFAULT 'en',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_lang ON users(lang);",
        )
        .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRecord> {
        let lang: String = row.get("lang")?;
        Ok(ProfileRecord {
            user_id: row.get("tg_id")?,
            name: row.get("name")?,
            age: row.get("age")?,
            gender: row.get("gender")?,
            interests: row.get("interests")?,
            bio: row.get("bio")?,
            photo_ref: row.get("photo")?,
            language: Language::from_code(&lang).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn upsert(&self, record: &ProfileRecord) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (tg_id, name, age, gender, interests, bio, photo, lang, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             ON CONFLICT(tg_id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                gender = excluded.gender,
                interests = excluded.interests,
                bio = excluded.bio,
                photo = excluded.photo,
                lang = excluded.lang,
                updated_at = excluded.updated_at",
            params![
                record.user_id,
                record.name,
                record.age,
                record.gender,
                record.interests,
                record.bio,
                record.photo_ref,
                record.language.code(),
                now,
            ],
        )?;
        Ok(())
    }

    async fn get(&self, user_id: i64) -> Result<Option<ProfileRecord>, StoreError> {
        let conn = self.conn();
        let record = conn
            .query_row(
                "SELECT tg_id, name, age, gender, interests, bio, photo, lang
                 FROM users WHERE tg_id = ?1",
                params![user_id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }
}
