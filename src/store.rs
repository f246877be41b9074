//! User record storage boundary.
//!
//! The privileged procedure only ever talks to storage through
//! [`UserStore`]. [`MemoryUserStore`] is a concurrent in-memory
//! implementation for tests and demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::error::NotFoundError;

/// Field path that holds a user's display name.
pub const DISPLAY_NAME_FIELD: &str = "profile.name";

/// Storage collaborator holding user records.
///
/// Implementations must apply a single-field update as a unit.
pub trait UserStore: Send + Sync {
    /// Sets `field` on record `id` to `value`.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundError` if no record with `id` exists.
    fn update_field(&self, id: &str, field: &str, value: &str) -> Result<(), NotFoundError>;
}

/// A user record as held by [`MemoryUserStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    fields: HashMap<String, String>,
}

impl UserRecord {
    /// Returns the value of `field`, if set.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Returns the display name, if set.
    pub fn display_name(&self) -> Option<&str> {
        self.field(DISPLAY_NAME_FIELD)
    }
}

/// In-memory user store backed by a concurrent map.
///
/// # Examples
///
/// ```
/// use origin_gate::{MemoryUserStore, UserStore};
///
/// let store = MemoryUserStore::new();
/// store.insert_user("u1");
///
/// store.update_field("u1", "profile.name", "John Doe").unwrap();
/// assert_eq!(store.display_name("u1").as_deref(), Some("John Doe"));
///
/// assert!(store.update_field("missing", "profile.name", "x").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    records: DashMap<String, UserRecord>,
    writes: AtomicUsize,
}

impl MemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an empty record for `id`, replacing any existing one.
    pub fn insert_user(&self, id: impl Into<String>) {
        self.records.insert(id.into(), UserRecord::default());
    }

    /// Returns a snapshot of record `id`.
    pub fn get(&self, id: &str) -> Option<UserRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Returns the display name of record `id`, if the record exists and has one.
    pub fn display_name(&self, id: &str) -> Option<String> {
        self.records
            .get(id)
            .and_then(|r| r.display_name().map(str::to_string))
    }

    /// Returns the number of successful writes applied so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl UserStore for MemoryUserStore {
    fn update_field(&self, id: &str, field: &str, value: &str) -> Result<(), NotFoundError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| NotFoundError::new(id))?;

        record.fields.insert(field.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_sets_field() {
        let store = MemoryUserStore::new();
        store.insert_user("u1");

        store.update_field("u1", DISPLAY_NAME_FIELD, "Alice").unwrap();

        let record = store.get("u1").unwrap();
        assert_eq!(record.display_name(), Some("Alice"));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn update_only_touches_named_field() {
        let store = MemoryUserStore::new();
        store.insert_user("u1");

        store.update_field("u1", "profile.bio", "hi").unwrap();
        store.update_field("u1", DISPLAY_NAME_FIELD, "Alice").unwrap();

        let record = store.get("u1").unwrap();
        assert_eq!(record.field("profile.bio"), Some("hi"));
        assert_eq!(record.display_name(), Some("Alice"));
    }

    #[test]
    fn update_missing_record_fails() {
        let store = MemoryUserStore::new();

        let err = store.update_field("ghost", DISPLAY_NAME_FIELD, "x").unwrap_err();
        assert_eq!(err.id(), "ghost");
        assert_eq!(store.write_count(), 0);
        assert!(store.get("ghost").is_none());
    }

    #[test]
    fn concurrent_updates_apply_as_units() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryUserStore::new());
        store.insert_user("u1");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .update_field("u1", DISPLAY_NAME_FIELD, &format!("name-{}", i))
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.write_count(), 8);
        let name = store.display_name("u1").unwrap();
        assert!(name.starts_with("name-"));
    }
}
