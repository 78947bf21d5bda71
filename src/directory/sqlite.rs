//! SQLite-backed contact directory

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};

use super::{ContactResolver, normalize_address};
use crate::{Error, Result};

/// Contact directory backed by a local `SQLite` database
///
/// Expects a `contacts(name TEXT, number TEXT)` table; `number` is stored
/// normalized (digits only) on insert so lookups match across formatting.
pub struct SqliteDirectory {
    conn: Mutex<Connection>,
}

impl SqliteDirectory {
    /// Open (and initialize if needed) a contacts database
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or initialized
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS contacts (
                id     INTEGER PRIMARY KEY,
                name   TEXT NOT NULL,
                number TEXT NOT NULL UNIQUE
            );
            CREATE INDEX IF NOT EXISTS idx_contacts_number ON contacts(number);",
        )?;

        tracing::debug!(path = %path.display(), "contacts database opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory contacts database (used by tests)
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be initialized
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS contacts (
                id     INTEGER PRIMARY KEY,
                name   TEXT NOT NULL,
                number TEXT NOT NULL UNIQUE
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace a contact
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub fn upsert(&self, name: &str, number: &str) -> Result<()> {
        let normalized = normalize_address(number);
        if normalized.is_empty() {
            return Err(Error::Directory(format!(
                "contact number has no digits: {number:?}"
            )));
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Directory(format!("lock poisoned: {e}")))?;
        conn.execute(
            "INSERT INTO contacts (name, number) VALUES (?1, ?2)
             ON CONFLICT(number) DO UPDATE SET name = excluded.name",
            (name, normalized.as_str()),
        )?;
        Ok(())
    }
}

#[async_trait]
impl ContactResolver for SqliteDirectory {
    async fn lookup(&self, address: &str) -> Result<Option<String>> {
        let normalized = normalize_address(address);
        if normalized.is_empty() {
            return Ok(None);
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Directory(format!("lock poisoned: {e}")))?;
        let name = conn
            .query_row(
                "SELECT name FROM contacts WHERE number = ?1",
                [normalized.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_and_lookup() {
        let dir = SqliteDirectory::open_in_memory().unwrap();
        dir.upsert("Alice", "+1 (555) 123-4567").unwrap();

        let name = dir.lookup("15551234567").await.unwrap();
        assert_eq!(name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn upsert_replaces_name() {
        let dir = SqliteDirectory::open_in_memory().unwrap();
        dir.upsert("Alice", "+15551234567").unwrap();
        dir.upsert("Alice Smith", "15551234567").unwrap();

        let name = dir.lookup("+15551234567").await.unwrap();
        assert_eq!(name.as_deref(), Some("Alice Smith"));
    }

    #[tokio::test]
    async fn lookup_miss() {
        let dir = SqliteDirectory::open_in_memory().unwrap();
        assert!(dir.lookup("+15550000000").await.unwrap().is_none());
    }

    #[test]
    fn digitless_upsert_rejected() {
        let dir = SqliteDirectory::open_in_memory().unwrap();
        assert!(dir.upsert("Nobody", "---").is_err());
    }
}
