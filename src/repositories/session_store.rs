// src/repositories/session_store.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::{
    create_connection_pool, initialize_database, verify_database_integrity, ConnectionPool,
};
use crate::error::{AppError, AppResult};

/// A persisted session value and when it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub persisted_at: DateTime<Utc>,
}

pub trait SessionStore: Send + Sync {
    fn put(&self, key: &str, value: &str, persisted_at: DateTime<Utc>) -> AppResult<()>;
    fn get(&self, key: &str) -> AppResult<Option<StoredValue>>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

pub struct SqliteSessionStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteSessionStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the session database at `db_path`.
    ///
    /// The schema is initialized and checked before the store is handed out.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        let pool = create_connection_pool(db_path)?;
        {
            let conn = pool.get()?;
            initialize_database(&conn)?;
            verify_database_integrity(&conn)?;
        }
        Ok(Self::new(Arc::new(pool)))
    }
}

impl SessionStore for SqliteSessionStore {
    fn put(&self, key: &str, value: &str, persisted_at: DateTime<Utc>) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT OR REPLACE INTO session_values (key, value, persisted_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, persisted_at.to_rfc3339()],
        )?;

        Ok(())
    }

    fn get(&self, key: &str) -> AppResult<Option<StoredValue>> {
        let conn = self.pool.get()?;

        let mut stmt =
            conn.prepare("SELECT value, persisted_at FROM session_values WHERE key = ?1")?;

        match stmt.query_row(params![key], |row| {
            let value: String = row.get(0)?;
            let persisted_at: String = row.get(1)?;
            Ok((value, persisted_at))
        }) {
            Ok((value, persisted_at)) => Ok(Some(StoredValue {
                value,
                persisted_at: DateTime::parse_from_rfc3339(&persisted_at)?.with_timezone(&Utc),
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM session_values WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Volatile store, for tests and sessions that should not outlive the process.
#[derive(Default)]
pub struct InMemorySessionStore {
    values: Mutex<HashMap<String, StoredValue>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, key: &str, value: &str, persisted_at: DateTime<Utc>) -> AppResult<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.to_string(),
                StoredValue {
                    value: value.to_string(),
                    persisted_at,
                },
            );
        Ok(())
    }

    fn get(&self, key: &str) -> AppResult<Option<StoredValue>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
