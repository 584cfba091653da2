//! The key/value capability the timer persists through.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Durable string key/value store.
///
/// The engine only ever stores serialized snapshots here, never live state.
/// Writers race with last-writer-wins semantics.
pub trait ClockStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: ClockStore + Sync> ClockStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

impl<S: ClockStore + ?Sized> ClockStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-memory store. Clones share the same map, so a test can keep one
/// handle and hand another to a "reloaded" engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write, like a full or denied browser quota.
    pub fn read_only() -> Self {
        Self {
            entries: Arc::default(),
            read_only: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }
}

impl ClockStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::WriteFailed("quota exceeded".into()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::WriteFailed("quota exceeded".into()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
