//! Contact directory adapters
//!
//! Resolve a phone-number-like address to a display name. Lookups are
//! read-only and best-effort; a failed lookup is treated as a miss by the
//! pipeline, never as a fatal error.

mod sqlite;

use async_trait::async_trait;

pub use sqlite::SqliteDirectory;

use crate::Result;
use crate::config::ContactEntry;

/// Trait for contact directory adapters
#[async_trait]
pub trait ContactResolver: Send + Sync {
    /// Resolve an address to a display name, `None` on no match
    async fn lookup(&self, address: &str) -> Result<Option<String>>;
}

/// Strip formatting punctuation from an address, keeping digits only
///
/// "+1 (555) 123-4567" and "15551234567" compare equal after normalization.
#[must_use]
pub fn normalize_address(address: &str) -> String {
    address.chars().filter(char::is_ascii_digit).collect()
}

/// In-memory directory backed by the contacts file
pub struct StaticDirectory {
    entries: Vec<(String, String)>,
}

impl StaticDirectory {
    /// Build a directory from contact entries
    #[must_use]
    pub fn new(contacts: &[ContactEntry]) -> Self {
        let entries = contacts
            .iter()
            .map(|c| (normalize_address(&c.number), c.name.clone()))
            .collect();
        Self { entries }
    }
}

#[async_trait]
impl ContactResolver for StaticDirectory {
    async fn lookup(&self, address: &str) -> Result<Option<String>> {
        let normalized = normalize_address(address);
        if normalized.is_empty() {
            return Ok(None);
        }
        Ok(self
            .entries
            .iter()
            .find(|(number, _)| *number == normalized)
            .map(|(_, name)| name.clone()))
    }
}

/// Directory that never matches; used when no backend is configured
pub struct NullDirectory;

#[async_trait]
impl ContactResolver for NullDirectory {
    async fn lookup(&self, _address: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
